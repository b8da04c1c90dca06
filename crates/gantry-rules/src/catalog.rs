//! The safety-rule catalog.
//!
//! `SafetyRules` seeds twelve built-in rules across four categories at
//! construction time and treats runtime-added custom rules uniformly for
//! lookup, enable/disable, and category filtering. Rule names are unique
//! across both sets.
//!
//! The catalog also owns the numeric limits and the structural-element
//! vocabulary (type identifiers and name keywords). Its check functions are
//! pure: they compare counts against configured limits and report a message,
//! never touching document state.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use gantry_contracts::error::{GantryError, GantryResult};
use gantry_contracts::operation::OpKind;
use gantry_contracts::permission::PermissionLevel;
use gantry_contracts::violation::{RuleCategory, SafetyRule, Severity};

/// Safety enforcement modes.
///
/// `Strict` enables every built-in rule; `Permissive` leaves the
/// strict-only rules disabled; `Custom` starts like `Permissive` and
/// expects the caller to toggle rules explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyMode {
    Strict,
    Permissive,
    Custom,
}

/// Numeric limits enforced by the operational and data rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Cap on operations per batch.
    pub max_operations_per_batch: usize,
    /// Wall-clock budget for one batch, in seconds.
    pub max_execution_secs: f64,
    /// Deletes affecting more objects than this require confirmation.
    pub max_delete_objects: usize,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_operations_per_batch: 50,
            max_execution_secs: 30.0,
            max_delete_objects: 10,
        }
    }
}

impl SafetyLimits {
    /// The execution budget as a `Duration`.
    pub fn max_execution_time(&self) -> Duration {
        Duration::from_secs_f64(self.max_execution_secs)
    }
}

/// Default load-bearing element type identifiers.
const STRUCTURAL_ELEMENT_TYPES: &[&str] = &[
    "Arch::Wall",
    "Arch::Structure",
    "Arch::Floor",
    "Arch::Building",
    "Arch::Foundation",
    "Arch::Rebar",
];

/// Default non-structural BIM element type identifiers.
const NON_STRUCTURAL_ELEMENT_TYPES: &[&str] = &[
    "Arch::Window",
    "Arch::Door",
    "Arch::Roof",
    "Arch::Stairs",
    "Arch::Space",
    "Arch::Equipment",
    "Arch::Furniture",
];

/// Default structural name keywords used by the delete heuristics.
const STRUCTURAL_KEYWORDS: &[&str] = &["wall", "column", "beam", "foundation", "structural"];

/// A serializable dump of the whole catalog, for audit and configuration
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesExport {
    pub mode: SafetyMode,
    pub rules: Vec<SafetyRule>,
    pub limits: SafetyLimits,
    pub structural_types: Vec<String>,
}

/// The rule catalog plus limits and structural vocabulary.
#[derive(Debug, Clone)]
pub struct SafetyRules {
    mode: SafetyMode,
    limits: SafetyLimits,
    builtin: BTreeMap<String, SafetyRule>,
    custom: Vec<SafetyRule>,
    structural_types: BTreeSet<String>,
    non_structural_types: BTreeSet<String>,
    structural_keywords: Vec<String>,
}

impl SafetyRules {
    /// Seed the built-in catalog for the given mode with default limits.
    pub fn new(mode: SafetyMode) -> Self {
        Self::with_limits(mode, SafetyLimits::default())
    }

    /// Seed the built-in catalog with explicit limits.
    pub fn with_limits(mode: SafetyMode, limits: SafetyLimits) -> Self {
        let mut builtin = BTreeMap::new();
        for rule in builtin_rules(mode, &limits) {
            builtin.insert(rule.name.clone(), rule);
        }
        Self {
            mode,
            limits,
            builtin,
            custom: Vec::new(),
            structural_types: STRUCTURAL_ELEMENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            non_structural_types: NON_STRUCTURAL_ELEMENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            structural_keywords: STRUCTURAL_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn mode(&self) -> SafetyMode {
        self.mode
    }

    pub fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Replace the structural type vocabulary (host-specific configuration).
    pub fn set_structural_types(&mut self, types: impl IntoIterator<Item = String>) {
        self.structural_types = types.into_iter().collect();
    }

    /// Replace the structural keyword vocabulary.
    pub fn set_structural_keywords(&mut self, keywords: impl IntoIterator<Item = String>) {
        self.structural_keywords = keywords.into_iter().collect();
    }

    // ── Registry operations ───────────────────────────────────────────────────

    /// Look up a rule by name across built-in and custom sets.
    pub fn rule(&self, name: &str) -> Option<&SafetyRule> {
        self.builtin
            .get(name)
            .or_else(|| self.custom.iter().find(|r| r.name == name))
    }

    /// True when the named rule exists and is enabled. Unknown rules are
    /// treated as disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.rule(name).map(|r| r.enabled).unwrap_or(false)
    }

    /// Enable a rule by name. Unknown names are logged and ignored.
    pub fn enable(&mut self, name: &str) {
        self.set_enabled(name, true);
    }

    /// Disable a rule by name. Unknown names are logged and ignored.
    pub fn disable(&mut self, name: &str) {
        self.set_enabled(name, false);
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(rule) = self.builtin.get_mut(name) {
            rule.enabled = enabled;
            return;
        }
        if let Some(rule) = self.custom.iter_mut().find(|r| r.name == name) {
            rule.enabled = enabled;
            return;
        }
        warn!(rule = %name, "attempted to toggle unknown rule");
    }

    /// Append a custom rule.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::DuplicateRule` when the name collides with any
    /// existing built-in or custom rule.
    pub fn add_custom_rule(&mut self, rule: SafetyRule) -> GantryResult<()> {
        if self.rule(&rule.name).is_some() {
            return Err(GantryError::DuplicateRule { name: rule.name });
        }
        self.custom.push(rule);
        Ok(())
    }

    /// All enabled rules in the given category, built-in and custom alike.
    pub fn rules_in_category(&self, category: RuleCategory) -> Vec<&SafetyRule> {
        self.all_rules()
            .filter(|r| r.category == category && r.enabled)
            .collect()
    }

    /// All enabled rules.
    pub fn enabled_rules(&self) -> Vec<&SafetyRule> {
        self.all_rules().filter(|r| r.enabled).collect()
    }

    fn all_rules(&self) -> impl Iterator<Item = &SafetyRule> {
        self.builtin.values().chain(self.custom.iter())
    }

    // ── Structural vocabulary ─────────────────────────────────────────────────

    /// True when the type identifier names a load-bearing element.
    pub fn is_structural_type(&self, type_id: &str) -> bool {
        self.structural_types.contains(type_id)
    }

    /// True when the type identifier names a known non-structural element.
    pub fn is_non_structural_type(&self, type_id: &str) -> bool {
        self.non_structural_types.contains(type_id)
    }

    pub fn structural_types(&self) -> &BTreeSet<String> {
        &self.structural_types
    }

    pub fn structural_keywords(&self) -> &[String] {
        &self.structural_keywords
    }

    // ── Pure checks ───────────────────────────────────────────────────────────

    /// Check a batch size against the operational cap.
    ///
    /// Passes unconditionally when `limit_operation_complexity` is disabled.
    pub fn check_batch_size(&self, num_operations: usize) -> Result<(), String> {
        if !self.is_enabled("limit_operation_complexity") {
            return Ok(());
        }
        if num_operations > self.limits.max_operations_per_batch {
            return Err(format!(
                "too many operations: {} (max: {})",
                num_operations, self.limits.max_operations_per_batch
            ));
        }
        Ok(())
    }

    /// Check a delete's affected-object count against the mass-delete cap.
    ///
    /// Passes unconditionally when `no_mass_delete` is disabled.
    pub fn check_mass_delete(&self, num_objects: usize) -> Result<(), String> {
        if !self.is_enabled("no_mass_delete") {
            return Ok(());
        }
        if num_objects > self.limits.max_delete_objects {
            return Err(format!(
                "mass delete blocked: {} objects (max: {}); use the explicit confirmation flag",
                num_objects, self.limits.max_delete_objects
            ));
        }
        Ok(())
    }

    /// The permission level required for an operation kind.
    pub fn required_permission(&self, kind: OpKind) -> PermissionLevel {
        PermissionLevel::required_for(kind)
    }

    /// Export the full catalog for auditing or configuration display.
    pub fn export(&self) -> RulesExport {
        RulesExport {
            mode: self.mode,
            rules: self.all_rules().cloned().collect(),
            limits: self.limits.clone(),
            structural_types: self.structural_types.iter().cloned().collect(),
        }
    }
}

/// The twelve built-in rules, seeded per mode.
fn builtin_rules(mode: SafetyMode, limits: &SafetyLimits) -> Vec<SafetyRule> {
    let strict = mode == SafetyMode::Strict;
    vec![
        // Structural safety
        SafetyRule {
            name: "no_delete_load_bearing".to_string(),
            description: "Prevent deletion of load-bearing structural elements".to_string(),
            category: RuleCategory::Structural,
            severity: Severity::Error,
            enabled: true,
        },
        SafetyRule {
            name: "no_break_dependencies".to_string(),
            description: "Prevent breaking parent-child dependencies".to_string(),
            category: RuleCategory::Structural,
            severity: Severity::Error,
            enabled: true,
        },
        SafetyRule {
            name: "no_floating_objects".to_string(),
            description: "Prevent creating objects with no structural support".to_string(),
            category: RuleCategory::Structural,
            severity: Severity::Warning,
            enabled: strict,
        },
        // Data safety
        SafetyRule {
            name: "require_delete_confirmation".to_string(),
            description: "Require explicit confirmation for delete operations".to_string(),
            category: RuleCategory::Data,
            severity: Severity::Error,
            enabled: true,
        },
        SafetyRule {
            name: "maintain_version_history".to_string(),
            description: "Maintain operation history for rollback".to_string(),
            category: RuleCategory::Data,
            severity: Severity::Warning,
            enabled: true,
        },
        SafetyRule {
            name: "validate_file_integrity".to_string(),
            description: "Validate file integrity before and after operations".to_string(),
            category: RuleCategory::Data,
            severity: Severity::Error,
            enabled: true,
        },
        SafetyRule {
            name: "no_mass_delete".to_string(),
            description: format!(
                "Block deletion of more than {} objects",
                limits.max_delete_objects
            ),
            category: RuleCategory::Data,
            severity: Severity::Error,
            enabled: true,
        },
        // Operational safety
        SafetyRule {
            name: "limit_operation_complexity".to_string(),
            description: format!(
                "Limit to {} operations per batch",
                limits.max_operations_per_batch
            ),
            category: RuleCategory::Operational,
            severity: Severity::Error,
            enabled: true,
        },
        SafetyRule {
            name: "timeout_protection".to_string(),
            description: format!("Maximum execution time: {}s", limits.max_execution_secs),
            category: RuleCategory::Operational,
            severity: Severity::Error,
            enabled: true,
        },
        SafetyRule {
            name: "rollback_capability".to_string(),
            description: "Ensure all operations can be rolled back".to_string(),
            category: RuleCategory::Operational,
            severity: Severity::Error,
            enabled: true,
        },
        // Permission safety
        SafetyRule {
            name: "require_permission_elevation".to_string(),
            description: "Require explicit permission for destructive operations".to_string(),
            category: RuleCategory::Permission,
            severity: Severity::Error,
            enabled: true,
        },
        SafetyRule {
            name: "audit_all_operations".to_string(),
            description: "Log all operations for the audit trail".to_string(),
            category: RuleCategory::Permission,
            severity: Severity::Warning,
            enabled: true,
        },
    ]
}
