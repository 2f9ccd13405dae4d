//! `confmend rules`: list the effective pairing rules.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use confmend_core::config::AppConfig;
use confmend_core::validation::PairingRule;
use confmend_core::Mender;

use super::style;

pub fn run(config: &AppConfig) -> Result<()> {
    // Building the pipeline compiles every rule, so bad patterns surface here.
    let mender = Mender::new(config)?;
    let rules = mender.validator().rules();

    println!();
    if rules.is_empty() {
        println!("{}", style::warn("No pairing rules configured"));
        println!();
        return Ok(());
    }

    println!("{}", style::header(&format!("Pairing Rules ({})", rules.len())));
    println!();

    let table = rules_table(rules);
    println!("{}", table);
    if !config.validation.enabled {
        println!();
        println!(
            "{}",
            style::dim("Validation is disabled; rules are only applied by `confmend check`.")
        );
    }
    println!();

    Ok(())
}

fn rules_table(rules: &[PairingRule]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Flag", "Requires", "Description"]);

    for rule in rules {
        table.add_row(vec![
            Cell::new(&rule.name),
            Cell::new(rule.flag_pattern()),
            Cell::new(rule.requires_pattern()),
            Cell::new(&rule.description),
        ]);
    }
    table
}
