//! TOML-driven catalog configuration.
//!
//! A `RulesConfig` document can override the enforcement mode, numeric
//! limits, structural vocabulary, per-rule enablement, and append custom
//! rules. Every field is optional; an empty document yields the strict
//! defaults.
//!
//! Example:
//!
//! ```toml
//! mode = "permissive"
//!
//! [limits]
//! max_operations_per_batch = 20
//! max_delete_objects = 5
//!
//! disabled = ["require_delete_confirmation"]
//!
//! [[custom]]
//! name = "no_weekend_deploys"
//! description = "Block execution outside business hours"
//! category = "operational"
//! severity = "warning"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use gantry_contracts::error::{GantryError, GantryResult};
use gantry_contracts::violation::{RuleCategory, SafetyRule, Severity};

use crate::catalog::{SafetyLimits, SafetyMode, SafetyRules};

/// Optional overrides for `SafetyLimits`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsOverride {
    pub max_operations_per_batch: Option<usize>,
    pub max_execution_secs: Option<f64>,
    pub max_delete_objects: Option<usize>,
}

impl LimitsOverride {
    fn apply(&self, mut limits: SafetyLimits) -> SafetyLimits {
        if let Some(n) = self.max_operations_per_batch {
            limits.max_operations_per_batch = n;
        }
        if let Some(secs) = self.max_execution_secs {
            limits.max_execution_secs = secs;
        }
        if let Some(n) = self.max_delete_objects {
            limits.max_delete_objects = n;
        }
        limits
    }
}

/// One custom rule declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRuleConfig {
    pub name: String,
    pub description: String,
    pub category: RuleCategory,
    pub severity: Severity,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// The top-level structure deserialized from a TOML rules file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Enforcement mode; defaults to strict.
    pub mode: Option<SafetyMode>,
    #[serde(default)]
    pub limits: LimitsOverride,
    /// Host-specific structural element type identifiers.
    pub structural_types: Option<Vec<String>>,
    /// Structural name keywords for the delete heuristics.
    pub structural_keywords: Option<Vec<String>>,
    /// Rules to disable after seeding.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Custom rules appended after seeding.
    #[serde(default)]
    pub custom: Vec<CustomRuleConfig>,
}

impl RulesConfig {
    /// Parse `s` as a TOML rules document.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::Config` when the TOML is malformed or does not
    /// match the expected schema.
    pub fn from_toml_str(s: &str) -> GantryResult<Self> {
        toml::from_str(s).map_err(|e| GantryError::Config {
            reason: format!("failed to parse rules TOML: {}", e),
        })
    }

    /// Read and parse the rules file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::Config` when the file cannot be read or its
    /// contents are not valid TOML.
    pub fn from_file(path: &Path) -> GantryResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GantryError::Config {
            reason: format!("failed to read rules file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

impl SafetyRules {
    /// Build a catalog from a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::DuplicateRule` when a custom rule's name
    /// collides with a built-in or an earlier custom rule.
    pub fn from_config(config: &RulesConfig) -> GantryResult<Self> {
        let mode = config.mode.unwrap_or(SafetyMode::Strict);
        let limits = config.limits.apply(SafetyLimits::default());

        let mut rules = Self::with_limits(mode, limits);

        if let Some(types) = &config.structural_types {
            rules.set_structural_types(types.iter().cloned());
        }
        if let Some(keywords) = &config.structural_keywords {
            rules.set_structural_keywords(keywords.iter().cloned());
        }
        for name in &config.disabled {
            rules.disable(name);
        }
        for custom in &config.custom {
            rules.add_custom_rule(SafetyRule {
                name: custom.name.clone(),
                description: custom.description.clone(),
                category: custom.category,
                severity: custom.severity,
                enabled: custom.enabled,
            })?;
        }

        Ok(rules)
    }
}
