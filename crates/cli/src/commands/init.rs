//! `confmend init`: write a commented default configuration.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use confmend_core::config::DEFAULT_CONFIG_TOML;

use super::style;

pub fn run(output: &Path) -> Result<()> {
    if output.exists() {
        bail!(
            "{} already exists; remove it or pass a different --output",
            output.display()
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(output, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!();
    println!(
        "{}",
        style::success(&format!("Configuration written to {}", output.display()))
    );
    println!();
    println!("{}", style::header("Next steps:"));
    println!();
    println!("  1. Pick a default policy under [resolve], or pass --policy each time.");
    println!();
    println!("  2. List the pairing rules in effect:");
    println!("       confmend rules --config {}", output.display());
    println!();
    println!("  3. Resolve a conflicted file:");
    println!(
        "       confmend resolve build.gradle.kts --in-place --config {}",
        output.display()
    );
    println!();

    Ok(())
}
