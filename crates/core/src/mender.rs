//! The scan -> resolve -> validate pipeline.
//!
//! [`Mender`] owns everything built from the config (merger, compiled rule
//! table) so one instance can process any number of inputs. Each run either
//! returns a complete [`ResolvedConfig`] or an error; there is no partial
//! output.

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::conflict::{scan, ConfigDocument, ConflictResolver, Policy, ResolvedConfig, UnionMerger};
use crate::errors::{ConfigError, CoreError};
use crate::validation::{Finding, Validator};

/// Configured pipeline.
#[derive(Debug, Clone)]
pub struct Mender {
    policy: Option<Policy>,
    marker_size: usize,
    resolver: ConflictResolver,
    validator: Validator,
    validate: bool,
}

impl Mender {
    /// Build from a config, compiling the rule table.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let merger = UnionMerger::new(config.resolve.space_assignment_keys.iter().cloned());
        let validator = Validator::from_config(&config.validation, config.resolve.marker_size)?;
        Ok(Self {
            policy: config.resolve.policy,
            marker_size: config.resolve.marker_size,
            resolver: ConflictResolver::new(merger),
            validator,
            validate: config.validation.enabled,
        })
    }

    /// Override the configured policy when `policy` is set.
    pub fn with_policy(mut self, policy: Option<Policy>) -> Self {
        if policy.is_some() {
            self.policy = policy;
        }
        self
    }

    /// Turn post-resolution validation on or off.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Scan only.
    pub fn scan(&self, text: &str) -> Result<ConfigDocument, CoreError> {
        Ok(scan(text, self.marker_size)?)
    }

    /// Scan, resolve and (unless disabled) validate `text`.
    pub fn run(&self, text: &str) -> Result<ResolvedConfig, CoreError> {
        let document = self.scan(text)?;

        let policy = match (self.policy, document.has_conflicts()) {
            (Some(policy), _) => policy,
            // Marker-free input resolves to itself under any policy.
            (None, false) => Policy::Ours,
            (None, true) => {
                return Err(ConfigError::InvalidValue {
                    field: "resolve.policy".into(),
                    detail: format!(
                        "input has {} conflict region(s); choose ours, theirs or union",
                        document.region_count()
                    ),
                }
                .into())
            }
        };

        let resolved = self.resolver.resolve(&document, policy);

        if self.validate {
            self.validator.validate(resolved.text())?;
        } else {
            warn!("validation disabled");
        }

        info!(
            regions = resolved.outcomes().len(),
            bytes = resolved.text().len(),
            "configuration mended"
        );
        Ok(resolved)
    }

    /// Scan and validate without resolving.
    ///
    /// Returns the document together with every finding; unresolved regions
    /// show up as residual-marker findings.
    pub fn check(&self, text: &str) -> Result<(ConfigDocument, Vec<Finding>), CoreError> {
        let document = self.scan(text)?;
        let findings = self.validator.findings(text);
        Ok((document, findings))
    }
}
