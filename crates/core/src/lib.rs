//! confmend core library.
//!
//! This crate resolves version-control conflict markers in build
//! configuration files and validates the result: marker scanning, policy
//! based resolution with a key-aware union merge, a declarative pairing-rule
//! validator, and TOML configuration.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod mender;
pub mod validation;

// Re-exports for convenience.
pub use config::AppConfig;
pub use conflict::{Policy, ResolvedConfig};
pub use errors::CoreError;
pub use mender::Mender;
