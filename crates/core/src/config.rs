//! TOML-based configuration for confmend.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below. The merge policy has no default: it must be
//! named here or on the command line whenever the input has conflicts.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::merger::DEFAULT_SPACE_ASSIGNMENT_KEYS;
use crate::conflict::scanner::DEFAULT_MARKER_SIZE;
use crate::conflict::Policy;
use crate::errors::ConfigError;
use crate::validation::builtin_rules;

/// Smallest and largest accepted conflict marker length.
pub const MARKER_SIZE_RANGE: std::ops::RangeInclusive<usize> = 3..=64;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Conflict resolution settings.
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Post-resolution validation settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// Conflict resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Policy applied to every region; `None` means it must come from the CLI.
    #[serde(default)]
    pub policy: Option<Policy>,

    /// Marker length (git's `conflict-marker-size`, default 7).
    #[serde(default = "default_marker_size")]
    pub marker_size: usize,

    /// Property names treated as `name value` assignments by the union merge.
    #[serde(default = "default_space_assignment_keys")]
    pub space_assignment_keys: Vec<String>,
}

fn default_marker_size() -> usize {
    DEFAULT_MARKER_SIZE
}
fn default_space_assignment_keys() -> Vec<String> {
    DEFAULT_SPACE_ASSIGNMENT_KEYS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            policy: None,
            marker_size: default_marker_size(),
            space_assignment_keys: default_space_assignment_keys(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A pairing rule as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
    /// Unique rule name.
    pub name: String,
    /// Line pattern that enables the rule.
    pub flag: String,
    /// Pattern some line must match when the flag is enabled.
    pub requires: String,
    /// Shown when the pairing is missing.
    #[serde(default)]
    pub description: String,
}

/// Post-resolution validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Run validation after resolving.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Check `{}`/`()`/`[]` balance.
    #[serde(default = "default_true")]
    pub check_brackets: bool,

    /// Include the built-in pairing rules.
    #[serde(default = "default_true")]
    pub builtin_rules: bool,

    /// Additional pairing rules.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_brackets: true,
            builtin_rules: true,
            rules: Vec::new(),
        }
    }
}

impl ValidationConfig {
    /// Built-in rules (when enabled) followed by the configured ones.
    pub fn effective_rules(&self) -> Vec<RuleConfig> {
        let mut rules = if self.builtin_rules {
            builtin_rules()
        } else {
            Vec::new()
        };
        rules.extend(self.rules.iter().cloned());
        rules
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validating
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Parse an [`AppConfig`] from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate that all values are sane.
    ///
    /// Rule patterns are compiled later by the validator, which reports bad
    /// regexes with the same error type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !MARKER_SIZE_RANGE.contains(&self.resolve.marker_size) {
            return Err(ConfigError::InvalidValue {
                field: "resolve.marker_size".into(),
                detail: format!(
                    "must be between {} and {}",
                    MARKER_SIZE_RANGE.start(),
                    MARKER_SIZE_RANGE.end()
                ),
            });
        }

        let mut seen = HashSet::new();
        for rule in self.validation.effective_rules() {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "validation.rules.name".into(),
                    detail: "rule name must not be empty".into(),
                });
            }
            if !seen.insert(rule.name.clone()) {
                return Err(ConfigError::InvalidValue {
                    field: format!("validation.rules.{}", rule.name),
                    detail: "duplicate rule name".into(),
                });
            }
        }

        if !matches!(
            self.log.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        ) {
            return Err(ConfigError::InvalidValue {
                field: "log.level".into(),
                detail: format!("unknown level '{}'", self.log.level),
            });
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// The file written by `confmend init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# confmend configuration
# All sections are optional.

[resolve]
# Policy applied to every conflict region: "ours", "theirs" or "union".
# There is no default; pass --policy or set it here.
# policy = "union"
marker_size = 7
space_assignment_keys = [
    "sourceCompatibility",
    "targetCompatibility",
    "coreLibraryDesugaringEnabled",
    "jvmTarget",
    "minSdkVersion",
    "targetSdkVersion",
    "compileSdkVersion",
    "namespace",
    "applicationId",
    "versionCode",
    "versionName",
]

[validation]
enabled = true
check_brackets = true
builtin_rules = true

# [[validation.rules]]
# name = "multidex"
# flag = '^\s*multiDexEnabled\s*(=\s*)?true\b'
# requires = 'androidx\.multidex:multidex'
# description = "multiDexEnabled needs the androidx multidex dependency"

# [[validation.rules]]
# name = "compose-compiler"
# flag = '^\s*compose\s*(=\s*)?true\b'
# requires = 'kotlinCompilerExtensionVersion|plugin\.compose|plugins\.kotlin\.compose'
# description = "buildFeatures.compose needs the Compose compiler plugin"

[log]
level = "warn"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[resolve]
policy = "theirs"
marker_size = 9
space_assignment_keys = ["jvmTarget"]

[validation]
enabled = true
check_brackets = false
builtin_rules = true

[[validation.rules]]
name = "multidex"
flag = '^\s*multiDexEnabled\s*(=\s*)?true\b'
requires = 'androidx\.multidex:multidex'
description = "multidex needs its library"

[log]
level = "debug"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_toml(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.resolve.policy, Some(Policy::Theirs));
        assert_eq!(config.resolve.marker_size, 9);
        assert_eq!(config.resolve.space_assignment_keys, vec!["jvmTarget"]);
        assert!(!config.validation.check_brackets);
        assert_eq!(config.validation.rules.len(), 1);
        assert_eq!(config.validation.effective_rules().len(), builtin_rules().len() + 1);
        assert_eq!(config.log.level, "debug");
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("confmend.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_and_validate(&path).expect("load failed");
        assert_eq!(config.resolve.marker_size, 9);
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/confmend.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = AppConfig::from_toml("[resolve]\npolicy = \"sideways\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.resolve.policy, None);
        assert_eq!(config.resolve.marker_size, 7);
        assert!(config
            .resolve
            .space_assignment_keys
            .contains(&"sourceCompatibility".to_string()));
        assert!(config.validation.enabled);
        assert!(config.validation.check_brackets);
        assert_eq!(config.log.level, "warn");
        config.validate().unwrap();
    }

    #[test]
    fn test_default_config_file_parses() {
        let config = AppConfig::from_toml(DEFAULT_CONFIG_TOML).unwrap();
        config.validate().unwrap();
        assert_eq!(config.resolve.policy, None);
    }

    #[test]
    fn test_validate_rejects_marker_size() {
        let mut config = AppConfig::default();
        config.resolve.marker_size = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "resolve.marker_size"
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_rule() {
        let mut config = AppConfig::default();
        config.validation.rules.push(RuleConfig {
            name: "core-library-desugaring".into(),
            flag: "x".into(),
            requires: "y".into(),
            description: String::new(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref detail, .. }) if detail == "duplicate rule name"
        ));
    }

    #[test]
    fn test_validate_rejects_log_level() {
        let mut config = AppConfig::default();
        config.log.level = "loud".into();
        assert!(config.validate().is_err());
    }
}
