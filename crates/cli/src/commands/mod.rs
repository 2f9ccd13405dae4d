//! Subcommand implementations.
//!
//! Provides the `resolve`, `check`, `rules` and `init` commands plus the
//! input/output helpers they share.

pub mod check;
pub mod init;
pub mod resolve;
pub mod rules;
pub mod style;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::debug;

/// Where resolved text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    File(PathBuf),
}

/// Read the whole input: a file, or stdin for `None` / `-`.
pub fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => {
            debug!(path = %path.display(), "reading input file");
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            debug!("reading stdin");
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Write `text` to the target. Files are replaced atomically through a
/// temporary file in the same directory.
pub fn write_output(target: &Target, text: &str) -> Result<()> {
    match target {
        Target::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write stdout")
        }
        Target::File(path) => write_atomic(path, text),
    }
}

fn write_atomic(path: &Path, text: &str) -> Result<()> {
    // Replace the file a symlink points at, not the link itself.
    let path = match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(_) => path.to_path_buf(),
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(text.as_bytes())
        .context("failed to write temporary file")?;

    if let Ok(existing) = std::fs::metadata(&path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .with_context(|| format!("failed to copy permissions of {}", path.display()))?;
    }

    tmp.persist(&path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    debug!(path = %path.display(), bytes = text.len(), "output written");
    Ok(())
}
