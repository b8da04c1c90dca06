//! The orchestrating session.
//!
//! One `Session` owns one of each pipeline component for its lifetime.
//! There is no process-global state: a session is created per document
//! engagement and disposed with it, and the permission ratchet resets only
//! by starting a fresh session.
//!
//! Control flow for a non-dry-run batch:
//!
//!   candidate → static validation → snapshot → safety evaluation →
//!   execution → audit
//!
//! The snapshot is taken before safety evaluation and execution, so a
//! restore point exists before any mutation can occur.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use gantry_audit::{AuditTrail, BatchRecord, ChainedLog};
use gantry_contracts::error::GantryResult;
use gantry_contracts::permission::PermissionLevel;
use gantry_contracts::result::{BatchId, ExecutionResult, OperationTrace};
use gantry_contracts::snapshot::{Snapshot, SnapshotSummary};
use gantry_contracts::violation::SafetyReport;
use gantry_core::executor::{ExecutionLogEntry, OperationExecutor};
use gantry_core::traits::DocumentHost;
use gantry_rollback::RollbackManager;
use gantry_rules::{RulesExport, SafetyRules};
use gantry_syntax::command::ValidatedCommand;
use gantry_syntax::validator::StaticValidator;
use gantry_validate::SafetyValidator;

/// A single validation/execution session against one document host.
pub struct Session {
    host: Arc<dyn DocumentHost>,
    parser: StaticValidator,
    safety: SafetyValidator,
    rollback: RollbackManager,
    executor: OperationExecutor,
    audit: ChainedLog,
    session_id: String,
}

impl Session {
    /// Create a session starting at the default `Modify` permission level.
    pub fn new(host: Arc<dyn DocumentHost>, rules: SafetyRules) -> GantryResult<Self> {
        Self::with_permission(host, rules, PermissionLevel::Modify)
    }

    /// Create a session starting at an explicit permission level.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::Config` when the script grammar or the
    /// snapshot storage cannot be initialized.
    pub fn with_permission(
        host: Arc<dyn DocumentHost>,
        rules: SafetyRules,
        permission: PermissionLevel,
    ) -> GantryResult<Self> {
        let parser = StaticValidator::new()?;
        let rollback = RollbackManager::new(host.clone())?;
        let executor = OperationExecutor::new(host.clone(), rules.limits().max_execution_time());
        let session_id = format!("session-{}", uuid::Uuid::new_v4());
        let audit = ChainedLog::new(session_id.clone());
        let safety = SafetyValidator::new(rules, host.clone(), permission);

        Ok(Self {
            host,
            parser,
            safety,
            rollback,
            executor,
            audit,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn host(&self) -> &Arc<dyn DocumentHost> {
        &self.host
    }

    // ── Pipeline surface ──────────────────────────────────────────────────────

    /// Statically validate and parse a raw candidate batch.
    pub fn validate_and_parse(&mut self, candidate: &Value) -> ValidatedCommand {
        self.parser.validate_and_parse(candidate)
    }

    /// Evaluate a validated command against the safety rules.
    pub fn validate_command(&mut self, command: &ValidatedCommand, confirmed: bool) -> SafetyReport {
        self.safety.validate_command(command, confirmed)
    }

    /// Execute an already-safety-approved command.
    ///
    /// For a non-dry run that would actually execute, a snapshot is taken
    /// first; when the `rollback_capability` rule is enabled and no
    /// snapshot can be taken, execution is refused. Every live batch is
    /// appended to the audit chain.
    pub fn execute_operations(
        &mut self,
        command: &ValidatedCommand,
        dry_run: bool,
    ) -> ExecutionResult {
        if dry_run {
            return self.executor.execute(command, true);
        }

        // Let the executor produce its own refusal when nothing can run;
        // there is no mutation to protect in those cases.
        let will_run =
            command.valid && self.host.is_loaded() && !command.operations.is_empty();
        if will_run {
            if let Some(refusal) = self.snapshot_gate() {
                return refusal;
            }
        }

        let result = self.executor.execute(command, false);
        if will_run {
            return self.record_audit(command, result);
        }
        result
    }

    /// Run the full pipeline on a raw candidate batch.
    ///
    /// Parse, snapshot (non-dry runs), safety-evaluate, execute, audit.
    /// Unsafe batches and batches still awaiting confirmation come back as
    /// failure results carrying the report, without touching the document.
    pub fn run(&mut self, candidate: &Value, confirmed: bool, dry_run: bool) -> ExecutionResult {
        let command = self.validate_and_parse(candidate);
        if !command.valid {
            return ExecutionResult::failed(
                "command validation failed",
                command.errors.join("; "),
                json!({ "errors": command.errors }),
            );
        }

        // Snapshot happens-before safety evaluation and execution.
        if !dry_run && self.host.is_loaded() && !command.operations.is_empty() {
            if let Some(refusal) = self.snapshot_gate() {
                return refusal;
            }
        }

        let report = self.safety.validate_command(&command, confirmed);
        if !report.safe {
            return ExecutionResult::failed(
                "command failed safety validation",
                self.safety.violations_summary(),
                json!({
                    "violations": serde_json::to_value(&report.violations).unwrap_or_default(),
                    "warnings": serde_json::to_value(&report.warnings).unwrap_or_default(),
                }),
            );
        }
        if report.requires_confirmation {
            return ExecutionResult::failed(
                "confirmation required before execution",
                "set confirmed=true to proceed",
                json!({ "requires_confirmation": true }),
            );
        }

        if dry_run {
            return self.executor.execute(&command, true);
        }
        let result = self.executor.execute(&command, false);
        self.record_audit(&command, result)
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    /// Create a snapshot of the current document state.
    pub fn create_snapshot(&mut self, description: &str) -> GantryResult<Snapshot> {
        self.rollback.create_snapshot(description)
    }

    /// Restore the document to the retained snapshot at `index`.
    pub fn rollback_to_snapshot(&mut self, index: usize) -> GantryResult<()> {
        self.rollback.rollback_to_snapshot(index)
    }

    /// Undo the most recent change.
    pub fn rollback_last_operation(&mut self) -> GantryResult<()> {
        self.rollback.rollback_last_operation()
    }

    pub fn can_rollback(&self) -> bool {
        self.rollback.can_rollback()
    }

    pub fn snapshot_history(&self) -> Vec<SnapshotSummary> {
        self.rollback.history()
    }

    // ── Permissions ───────────────────────────────────────────────────────────

    /// Raise the session's permission level (one-way ratchet).
    pub fn elevate_permission(&mut self, level: PermissionLevel) {
        self.safety.elevate_permission(level);
    }

    pub fn permission(&self) -> PermissionLevel {
        self.safety.permission()
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    /// The most recent execution-history entries, newest last.
    pub fn execution_history(&self, limit: usize) -> &[ExecutionLogEntry] {
        self.executor.history(limit)
    }

    /// Export the session's audit chain.
    pub fn audit_trail(&self) -> AuditTrail {
        self.audit.export()
    }

    /// Verify the audit chain has not been tampered with.
    pub fn verify_audit(&self) -> bool {
        self.audit.verify_integrity()
    }

    /// Export the rule catalog and limits for display.
    pub fn rules_export(&self) -> RulesExport {
        self.safety.rules().export()
    }

    /// Mutable access to the rule catalog (enable/disable, custom rules).
    pub fn rules_mut(&mut self) -> &mut SafetyRules {
        self.safety.rules_mut()
    }

    /// Human-readable summary of the most recent safety evaluation.
    pub fn violations_summary(&self) -> String {
        self.safety.violations_summary()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Take the pre-execution snapshot. Returns a refusal result when the
    /// snapshot fails and the `rollback_capability` rule demands one.
    fn snapshot_gate(&mut self) -> Option<ExecutionResult> {
        match self.rollback.create_snapshot("before batch execution") {
            Ok(_) => None,
            Err(e) => {
                if self.safety.rules().is_enabled("rollback_capability") {
                    Some(ExecutionResult::failed(
                        "cannot execute without rollback capability",
                        e.to_string(),
                        json!({}),
                    ))
                } else {
                    warn!(error = %e, "continuing without snapshot; rollback_capability disabled");
                    None
                }
            }
        }
    }

    /// Append the batch to the audit chain. An audit write failure turns
    /// the batch result into a failure: an unauditable batch is not
    /// reported as a success.
    fn record_audit(&mut self, command: &ValidatedCommand, result: ExecutionResult) -> ExecutionResult {
        let per_op = result.data.get("results").and_then(Value::as_array);
        let operations: Vec<OperationTrace> = command
            .operations
            .iter()
            .enumerate()
            .map(|(i, op)| OperationTrace {
                description: op.operation.description.clone(),
                kind: op.operation.kind,
                success: per_op
                    .and_then(|results| results.get(i))
                    .and_then(|r| r.get("success"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            })
            .collect();

        let executed = operations.iter().filter(|t| t.success).count();
        let record = BatchRecord {
            batch_id: BatchId::new(),
            timestamp: Utc::now(),
            operation_count: command.operations.len(),
            executed_count: executed,
            failure_count: command.operations.len() - executed,
            elapsed_ms: (result
                .data
                .get("execution_time")
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
                * 1000.0) as u64,
            operations,
        };

        if let Err(e) = self.audit.append(&record) {
            warn!(error = %e, "audit write failed");
            return ExecutionResult::failed(
                "audit write failed after execution",
                e.to_string(),
                result.data,
            );
        }
        result
    }
}
