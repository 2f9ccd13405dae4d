//! `confmend check`: report conflict regions and validation findings.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use confmend_core::config::AppConfig;
use confmend_core::conflict::{ConfigDocument, ConflictRegion};
use confmend_core::errors::ValidationError;
use confmend_core::validation::Finding;
use confmend_core::{CoreError, Mender};

use super::{read_input, style};

/// Print the report. Fails with a validation error when anything was found.
pub fn run(config: &AppConfig, input: Option<&Path>, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let mender = Mender::new(config)?;
    let (document, findings) = mender.check(&text)?;

    if json {
        let report = json_report(&document, &findings);
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        print_report(&document, &findings);
    }

    if findings.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(ValidationError::Invalid(findings)).into())
    }
}

fn json_report(document: &ConfigDocument, findings: &[Finding]) -> serde_json::Value {
    let regions: Vec<&ConflictRegion> = document.regions().collect();
    serde_json::json!({
        "clean": findings.is_empty(),
        "regions": regions,
        "findings": findings,
    })
}

fn print_report(document: &ConfigDocument, findings: &[Finding]) {
    println!();
    if document.has_conflicts() {
        println!(
            "{}",
            style::header(&format!("Conflict Regions ({})", document.region_count()))
        );
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["#", "Lines", "Ours", "Theirs", "Base"]);

        for (i, region) in document.regions().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(format!("{}-{}", region.start_line, region.end_line)),
                Cell::new(side_summary(region.ours_label.as_deref(), region.ours.len())),
                Cell::new(side_summary(
                    region.theirs_label.as_deref(),
                    region.theirs.len(),
                )),
                Cell::new(match &region.base {
                    Some(base) => format!("{} line(s)", base.len()),
                    None => "—".to_string(),
                }),
            ]);
        }

        println!("{}", table);
        println!();
    }

    if findings.is_empty() {
        println!("{}", style::success("No findings"));
    } else {
        println!(
            "{}",
            style::header(&format!("Findings ({})", findings.len()))
        );
        println!();
        for finding in findings {
            println!("  {}", style::error(&finding.to_string()));
        }
    }
    println!();
}

fn side_summary(label: Option<&str>, lines: usize) -> String {
    match label {
        Some(label) => format!("{} ({} line(s))", label, lines),
        None => format!("{} line(s)", lines),
    }
}
