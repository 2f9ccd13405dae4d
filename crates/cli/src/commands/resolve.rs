//! `confmend resolve`: scan, resolve, validate, write.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use confmend_core::config::AppConfig;
use confmend_core::{Mender, Policy, ResolvedConfig};

use super::{read_input, style, write_output, Target};

/// Resolve `input` and write the result to `target`.
///
/// Nothing is written unless every phase succeeds.
pub fn run(
    config: &AppConfig,
    input: Option<&Path>,
    policy: Option<Policy>,
    target: Target,
    validate: bool,
) -> Result<()> {
    let text = read_input(input)?;

    let mender = Mender::new(config)?
        .with_policy(policy)
        .with_validation(validate && config.validation.enabled);
    let resolved = mender.run(&text)?;

    write_output(&target, resolved.text())?;

    if let Target::File(path) = &target {
        report(&resolved, path);
    }
    info!(regions = resolved.outcomes().len(), "resolve finished");
    Ok(())
}

/// Summary on stderr when the result went to a file.
fn report(resolved: &ResolvedConfig, path: &Path) {
    let outcomes = resolved.outcomes();
    if outcomes.is_empty() {
        eprintln!(
            "{}",
            style::success(&format!("No conflicts; {} unchanged", path.display()))
        );
        return;
    }

    eprintln!(
        "{}",
        style::success(&format!(
            "Resolved {} region(s) into {}",
            outcomes.len(),
            path.display()
        ))
    );
    for outcome in outcomes {
        eprintln!(
            "  lines {:>4}-{:<4} {} {}",
            outcome.start_line,
            outcome.end_line,
            style::resolution(outcome.resolution),
            style::dim(&format!("({} line(s) written)", outcome.lines_written))
        );
        for shadow in &outcome.shadowed {
            eprintln!(
                "    {}",
                style::warn(&format!(
                    "{} on line {} dropped in favour of line {}",
                    shadow.key, shadow.dropped.line, shadow.kept.line
                ))
            );
        }
    }
}
