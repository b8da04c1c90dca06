//! The safety validator: policy evaluation over an already-syntax-checked
//! batch.
//!
//! Evaluation never short-circuits: every check may append violations, so
//! the caller sees the full picture in one pass. Violations are partitioned
//! into blocking findings (which make the batch unsafe) and advisory
//! warnings.
//!
//! The structural-delete guardrail is deliberately confirmation-proof:
//! `confirmed = true` can clear the confirmation and mass-delete gates but
//! never a load-bearing deletion.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use gantry_contracts::operation::OpKind;
use gantry_contracts::permission::PermissionLevel;
use gantry_contracts::violation::{SafetyReport, Violation};
use gantry_core::traits::DocumentHost;
use gantry_rules::SafetyRules;
use gantry_syntax::analyze::infer_delete_targets;
use gantry_syntax::command::{ValidatedCommand, ValidatedOperation};

/// Evaluates validated commands against the rule catalog and the current
/// document state.
///
/// Holds the session's current permission level. The level is a one-way
/// ratchet: it can be raised with `elevate_permission` and never lowered
/// within the same session.
pub struct SafetyValidator {
    rules: SafetyRules,
    host: Arc<dyn DocumentHost>,
    permission: PermissionLevel,
    violations: Vec<Violation>,
}

impl SafetyValidator {
    pub fn new(
        rules: SafetyRules,
        host: Arc<dyn DocumentHost>,
        permission: PermissionLevel,
    ) -> Self {
        Self {
            rules,
            host,
            permission,
            violations: Vec::new(),
        }
    }

    pub fn rules(&self) -> &SafetyRules {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut SafetyRules {
        &mut self.rules
    }

    pub fn permission(&self) -> PermissionLevel {
        self.permission
    }

    /// Evaluate one batch against all enabled safety rules.
    ///
    /// `confirmed` is the caller's explicit confirmation for destructive
    /// action. It clears the delete-confirmation and mass-delete gates; it
    /// does not clear structural or permission findings.
    pub fn validate_command(
        &mut self,
        command: &ValidatedCommand,
        confirmed: bool,
    ) -> SafetyReport {
        self.violations.clear();

        if !command.valid {
            let violation = Violation::blocking("invalid_command", "command is not valid");
            self.violations.push(violation.clone());
            return SafetyReport {
                safe: false,
                violations: vec![violation],
                warnings: vec![],
                requires_confirmation: false,
            };
        }

        self.check_operation_complexity(command);
        self.check_permissions(command);
        self.check_data_safety(command, confirmed);
        // Structural checks need the live object graph.
        if self.host.is_loaded() {
            self.check_structural_safety(command);
        }

        let blocking: Vec<Violation> = self
            .violations
            .iter()
            .filter(|v| v.blocked)
            .cloned()
            .collect();
        let warnings: Vec<Violation> = self
            .violations
            .iter()
            .filter(|v| !v.blocked)
            .cloned()
            .collect();

        SafetyReport {
            safe: blocking.is_empty(),
            violations: blocking,
            warnings,
            requires_confirmation: command.requires_confirmation && !confirmed,
        }
    }

    // ── Operational safety ────────────────────────────────────────────────────

    fn check_operation_complexity(&mut self, command: &ValidatedCommand) {
        if let Err(message) = self.rules.check_batch_size(command.operations.len()) {
            self.violations
                .push(Violation::blocking("limit_operation_complexity", message));
        }
    }

    // ── Permission safety ─────────────────────────────────────────────────────

    fn check_permissions(&mut self, command: &ValidatedCommand) {
        if !self.rules.is_enabled("require_permission_elevation") {
            return;
        }

        for op in &command.operations {
            let required = self.rules.required_permission(op.operation.kind);
            if required > self.permission {
                self.violations.push(Violation::blocking(
                    "require_permission_elevation",
                    format!(
                        "operation '{}' requires {} permission, but current level is {}",
                        op.operation.description, required, self.permission
                    ),
                ));
            }
        }
    }

    // ── Data safety ───────────────────────────────────────────────────────────

    fn check_data_safety(&mut self, command: &ValidatedCommand, confirmed: bool) {
        let delete_ops: Vec<&ValidatedOperation> = command
            .operations
            .iter()
            .filter(|op| op.operation.kind == OpKind::Delete)
            .collect();

        if delete_ops.is_empty() {
            return;
        }

        if self.rules.is_enabled("require_delete_confirmation") && !confirmed {
            self.violations.push(Violation::blocking(
                "require_delete_confirmation",
                format!(
                    "{} delete operation(s) require explicit confirmation; set confirmed=true to proceed",
                    delete_ops.len()
                ),
            ));
        }

        let total_affected: usize = delete_ops
            .iter()
            .map(|op| op.operation.affected_objects.len())
            .sum();

        if total_affected > 0 && !confirmed {
            if let Err(message) = self.rules.check_mass_delete(total_affected) {
                self.violations
                    .push(Violation::blocking("no_mass_delete", message));
            }
        }
    }

    // ── Structural safety ─────────────────────────────────────────────────────

    fn check_structural_safety(&mut self, command: &ValidatedCommand) {
        if self.rules.is_enabled("no_delete_load_bearing") {
            self.check_load_bearing_deletion(command);
        }
        if self.rules.is_enabled("no_break_dependencies") {
            self.check_dependency_violations(command);
        }
    }

    fn check_load_bearing_deletion(&mut self, command: &ValidatedCommand) {
        for op in command
            .operations
            .iter()
            .filter(|op| op.operation.kind == OpKind::Delete)
        {
            if self.is_deleting_structural_elements(&op.operation.code) {
                // Hard guardrail: never clearable by confirmation.
                self.violations.push(Violation::blocking(
                    "no_delete_load_bearing",
                    format!(
                        "operation attempts to delete load-bearing structural elements; \
                         this is blocked for safety (operation: {})",
                        op.operation.description
                    ),
                ));
            }
        }
    }

    /// Best-effort heuristic, biased toward blocking: a structural type
    /// identifier anywhere in the code, or a removal-style call combined
    /// with a structural name keyword, counts as structural.
    fn is_deleting_structural_elements(&self, code: &str) -> bool {
        for type_id in self.rules.structural_types() {
            if code.contains(type_id.as_str()) {
                return true;
            }
        }

        let code_lower = code.to_lowercase();
        if code_lower.contains("removeobject") || code_lower.contains("delete") {
            return self
                .rules
                .structural_keywords()
                .iter()
                .any(|keyword| code_lower.contains(keyword.as_str()));
        }

        false
    }

    fn check_dependency_violations(&mut self, command: &ValidatedCommand) {
        let delete_ops: Vec<&ValidatedOperation> = command
            .operations
            .iter()
            .filter(|op| op.operation.kind == OpKind::Delete)
            .collect();

        if delete_ops.is_empty() {
            return;
        }

        // Invert the host's outgoing dependency lists once per pass.
        let objects = self.host.objects();
        let mut dependencies: HashMap<&str, &[String]> = HashMap::new();
        for obj in &objects {
            if !obj.depends_on.is_empty() {
                dependencies.insert(obj.name.as_str(), obj.depends_on.as_slice());
            }
        }

        for op in delete_ops {
            for target in infer_delete_targets(op) {
                let dependents: Vec<&str> = dependencies
                    .iter()
                    .filter(|(_, deps)| deps.contains(&target))
                    .map(|(name, _)| *name)
                    .collect();

                if !dependents.is_empty() {
                    let mut sorted = dependents;
                    sorted.sort_unstable();
                    sorted.truncate(5);
                    self.violations.push(Violation::warning(
                        "no_break_dependencies",
                        format!(
                            "deleting '{}' may break dependencies; objects that depend on it: {}",
                            target,
                            sorted.join(", ")
                        ),
                    ));
                }
            }
        }
    }

    // ── Permission ratchet ────────────────────────────────────────────────────

    /// Raise the current permission level.
    ///
    /// Succeeds only for a strictly higher level. Lower-or-equal requests
    /// are refused and logged; there is no de-elevation path within a
    /// session.
    pub fn elevate_permission(&mut self, new_permission: PermissionLevel) {
        if new_permission > self.permission {
            info!(
                from = %self.permission,
                to = %new_permission,
                "permission elevated"
            );
            self.permission = new_permission;
        } else {
            warn!(
                current = %self.permission,
                requested = %new_permission,
                "cannot lower permission level"
            );
        }
    }

    // ── Reporting ─────────────────────────────────────────────────────────────

    /// A human-readable summary of the most recent validation pass.
    pub fn violations_summary(&self) -> String {
        if self.violations.is_empty() {
            return "No safety violations".to_string();
        }

        let blocking: Vec<&Violation> = self.violations.iter().filter(|v| v.blocked).collect();
        let warnings: Vec<&Violation> = self.violations.iter().filter(|v| !v.blocked).collect();

        let mut lines = Vec::new();
        if !blocking.is_empty() {
            lines.push(format!("BLOCKING VIOLATIONS ({}):", blocking.len()));
            for v in &blocking {
                lines.push(format!(
                    "  - [{}] {}",
                    v.severity.to_string().to_uppercase(),
                    v.message
                ));
            }
        }
        if !warnings.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("WARNINGS ({}):", warnings.len()));
            for v in &warnings {
                lines.push(format!(
                    "  - [{}] {}",
                    v.severity.to_string().to_uppercase(),
                    v.message
                ));
            }
        }

        lines.join("\n")
    }
}
