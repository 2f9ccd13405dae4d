//! Error types for the confmend core library.
//!
//! Each pipeline phase has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type (and an exit code).

use thiserror::Error;

use crate::validation::Finding;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Process exit code for this error: 1 malformed markers, 2 failed
    /// validation, 3 configuration or I/O.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Conflict(_) => 1,
            Self::Validation(_) => 2,
            Self::Config(_) => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict scan errors
// ---------------------------------------------------------------------------

/// Structural errors found while scanning conflict markers.
///
/// Every variant carries the 1-based line number of the offending line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    /// Input ended while a conflict region was still open.
    #[error("line {line}: conflict region opened here is never closed")]
    UnterminatedRegion { line: usize },

    /// A start marker appeared inside an open region.
    #[error("line {line}: nested conflict start marker (region opened at line {outer})")]
    NestedStart { line: usize, outer: usize },

    /// An end marker appeared before the separator.
    #[error("line {line}: end marker before separator (region opened at line {start})")]
    MissingSeparator { line: usize, start: usize },

    /// A second separator inside the same region.
    #[error("line {line}: duplicate separator (first at line {first})")]
    DuplicateSeparator { line: usize, first: usize },

    /// A base marker outside a region, after the separator, or repeated.
    #[error("line {line}: unexpected base marker")]
    UnexpectedBaseMarker { line: usize },

    /// A separator with no open region.
    #[error("line {line}: separator marker outside a conflict region")]
    UnexpectedSeparator { line: usize },

    /// An end marker with no open region.
    #[error("line {line}: end marker outside a conflict region")]
    UnexpectedEnd { line: usize },
}

impl ConflictError {
    /// The line number the error is reported at.
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedRegion { line }
            | Self::NestedStart { line, .. }
            | Self::MissingSeparator { line, .. }
            | Self::DuplicateSeparator { line, .. }
            | Self::UnexpectedBaseMarker { line }
            | Self::UnexpectedSeparator { line }
            | Self::UnexpectedEnd { line } => *line,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Semantic errors found after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more findings; never constructed with an empty list.
    #[error("invalid configuration: {}", summarize(.0))]
    Invalid(Vec<Finding>),
}

impl ValidationError {
    /// All findings, in line order.
    pub fn findings(&self) -> &[Finding] {
        match self {
            Self::Invalid(findings) => findings,
        }
    }
}

fn summarize(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
