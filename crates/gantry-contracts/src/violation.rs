//! Safety rule metadata and violation reporting types.
//!
//! The policy engine seeds a catalog of `SafetyRule`s; the safety validator
//! evaluates a batch against that catalog and produces a `SafetyReport`
//! whose violations are partitioned into blocking and advisory sets.

use serde::{Deserialize, Serialize};

/// Rule severity. Only `Error`-severity findings block execution; the
/// `blocked` flag on each violation records the final decision per finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

/// The four safety categories every rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Protects the model's structural integrity (load-bearing elements,
    /// dependency chains).
    Structural,
    /// Protects against data loss (confirmation gates, mass deletes).
    Data,
    /// Protects against resource exhaustion (batch size, wall-clock budget).
    Operational,
    /// Enforces access control and auditability.
    Permission,
}

/// A named, independently toggleable safety rule.
///
/// Built-in rules are seeded at catalog construction; custom rules may be
/// appended at runtime. Rule names are unique across both sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRule {
    /// Unique key, e.g. "no_mass_delete". Appears in every violation.
    pub name: String,
    /// Human-readable explanation of what the rule protects.
    pub description: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub enabled: bool,
}

/// One finding from a validation pass.
///
/// `blocked = true` prevents execution; `blocked = false` is advisory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the violated rule.
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub blocked: bool,
}

impl Violation {
    /// A blocking violation at error severity.
    pub fn blocking(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity: Severity::Error,
            message: message.into(),
            blocked: true,
        }
    }

    /// An advisory warning that does not block execution.
    pub fn warning(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity: Severity::Warning,
            message: message.into(),
            blocked: false,
        }
    }
}

/// The safety validator's verdict for one batch.
///
/// `violations` holds only blocking findings; `warnings` holds advisory
/// ones. `safe` is true exactly when `violations` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyReport {
    pub safe: bool,
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    /// True when the command declared it needs confirmation and the caller
    /// has not supplied it yet.
    pub requires_confirmation: bool,
}
