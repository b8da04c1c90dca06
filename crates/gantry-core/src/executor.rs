//! The operation executor: runs an approved batch against the live document.
//!
//! The executor is the only component that mutates the document. It runs
//! operations in supplied order inside a `ScriptScope` allow-list namespace,
//! under a cooperative wall-clock budget checked between operations (a
//! single blocking operation cannot be interrupted mid-flight; that is an
//! accepted limitation of this design). A per-operation failure becomes
//! that operation's result, never a batch abort; only the timeout path
//! aborts the remainder, and it preserves every completed result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use gantry_contracts::error::GantryError;
use gantry_contracts::result::{ExecutionResult, OperationTrace};
use gantry_syntax::analyze::referenced_modules;
use gantry_syntax::command::{ValidatedCommand, ValidatedOperation};

use crate::traits::{DocumentHost, ScriptScope};

/// Retained execution-history entries; oldest evicted past this.
const HISTORY_CAP: usize = 100;

/// One per-batch audit entry in the bounded execution history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub operation_count: usize,
    pub executed_count: usize,
    pub failure_count: usize,
    pub elapsed_ms: u64,
    pub operations: Vec<OperationTrace>,
}

/// Executes validated, safety-approved commands against the document host.
pub struct OperationExecutor {
    host: Arc<dyn DocumentHost>,
    max_execution_time: Duration,
    history: Vec<ExecutionLogEntry>,
}

impl OperationExecutor {
    /// Create an executor with the given wall-clock budget per batch.
    pub fn new(host: Arc<dyn DocumentHost>, max_execution_time: Duration) -> Self {
        Self {
            host,
            max_execution_time,
            history: Vec::new(),
        }
    }

    /// Execute a validated command.
    ///
    /// Refuses (failure result, nothing executed) when the command is
    /// invalid, no document is loaded, or the operation list is empty.
    /// A dry run produces the textual plan and touches nothing.
    pub fn execute(&mut self, command: &ValidatedCommand, dry_run: bool) -> ExecutionResult {
        if !command.valid {
            return ExecutionResult::failed(
                "cannot execute an invalid command",
                "command validation failed",
                json!({}),
            );
        }
        if !self.host.is_loaded() {
            return ExecutionResult::failed(
                "no document loaded",
                "document not loaded",
                json!({}),
            );
        }
        if command.operations.is_empty() {
            return ExecutionResult::failed(
                "no operations to execute",
                "empty operation list",
                json!({}),
            );
        }

        info!(
            operations = command.operations.len(),
            dry_run, "executing batch"
        );

        if dry_run {
            return dry_run_plan(command);
        }

        self.live_run(command)
    }

    fn live_run(&mut self, command: &ValidatedCommand) -> ExecutionResult {
        let total = command.operations.len();
        let start = Instant::now();

        // The namespace is derived from the trees, not the translator's
        // imports field, so undeclared-but-referenced modules are bound and
        // declared-but-unused ones are not.
        let scope = ScriptScope::for_modules(referenced_modules(&command.operations));

        let mut results: Vec<ExecutionResult> = Vec::with_capacity(total);
        let mut executed = 0usize;

        for (index, op) in command.operations.iter().enumerate() {
            // Cooperative budget check between operations; the first
            // operation always runs.
            let elapsed = start.elapsed();
            if index > 0 && elapsed > self.max_execution_time {
                let timeout = GantryError::Timeout {
                    elapsed_secs: elapsed.as_secs_f64(),
                    max_secs: self.max_execution_time.as_secs_f64(),
                };
                warn!(
                    executed,
                    total,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "batch aborted on timeout"
                );
                return ExecutionResult::failed(
                    format!("execution timeout after {} operations", executed),
                    timeout.to_string(),
                    json!({
                        "executed_count": executed,
                        "total_count": total,
                        "results": serde_json::to_value(&results).unwrap_or_default(),
                    }),
                );
            }

            let result = self.run_single(op, index + 1, total, &scope);
            if result.success {
                executed += 1;
            } else {
                warn!(
                    operation = index + 1,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "operation failed"
                );
            }
            results.push(result);
        }

        // One recompute per batch, not per operation.
        if executed > 0 {
            if let Err(e) = self.host.recompute() {
                return ExecutionResult::failed(
                    format!("execution failed after {} operations", executed),
                    e.to_string(),
                    json!({ "executed_count": executed, "total_count": total }),
                );
            }
        }

        let elapsed = start.elapsed();
        self.push_history(command, &results, elapsed);

        let all_succeeded = executed == total;
        let message = if all_succeeded {
            format!(
                "successfully executed {} operation(s) in {:.2}s",
                executed,
                elapsed.as_secs_f64()
            )
        } else if executed > 0 {
            format!(
                "partially executed {}/{} operation(s) in {:.2}s",
                executed,
                total,
                elapsed.as_secs_f64()
            )
        } else {
            "failed to execute operations".to_string()
        };

        let data = json!({
            "executed_count": executed,
            "total_count": total,
            "execution_time": elapsed.as_secs_f64(),
            "results": serde_json::to_value(&results).unwrap_or_default(),
        });

        if all_succeeded {
            ExecutionResult::ok(message, data)
        } else {
            ExecutionResult::failed(message, "one or more operations failed", data)
        }
    }

    /// Run one operation, converting any host error into its failure result.
    fn run_single(
        &self,
        op: &ValidatedOperation,
        number: usize,
        total: usize,
        scope: &ScriptScope,
    ) -> ExecutionResult {
        let description = &op.operation.description;
        info!(
            operation = number,
            total,
            description = %description,
            "executing operation"
        );

        match self.host.run_script(&op.operation.code, scope) {
            Ok(outcome) => ExecutionResult::ok(
                format!("operation completed: {}", description),
                json!({
                    "description": description,
                    "type": op.operation.kind.as_str(),
                    "created_objects": outcome.created_objects,
                }),
            ),
            Err(e) => ExecutionResult::failed(
                format!("operation failed: {}", description),
                e.to_string(),
                json!({ "description": description }),
            ),
        }
    }

    fn push_history(
        &mut self,
        command: &ValidatedCommand,
        results: &[ExecutionResult],
        elapsed: Duration,
    ) {
        let operations = command
            .operations
            .iter()
            .zip(results.iter())
            .map(|(op, result)| OperationTrace {
                description: op.operation.description.clone(),
                kind: op.operation.kind,
                success: result.success,
            })
            .collect::<Vec<_>>();

        let executed = operations.iter().filter(|t| t.success).count();
        self.history.push(ExecutionLogEntry {
            timestamp: Utc::now(),
            operation_count: command.operations.len(),
            executed_count: executed,
            failure_count: operations.len() - executed,
            elapsed_ms: elapsed.as_millis() as u64,
            operations,
        });

        if self.history.len() > HISTORY_CAP {
            let overflow = self.history.len() - HISTORY_CAP;
            self.history.drain(..overflow);
        }
    }

    /// The most recent history entries, newest last.
    pub fn history(&self, limit: usize) -> &[ExecutionLogEntry] {
        let len = self.history.len();
        &self.history[len.saturating_sub(limit)..]
    }

    /// Drop all retained history entries.
    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("execution history cleared");
    }
}

/// The textual plan for a dry run. Never touches the document, so repeated
/// calls are idempotent by construction.
fn dry_run_plan(command: &ValidatedCommand) -> ExecutionResult {
    let summary: Vec<String> = command
        .operations
        .iter()
        .enumerate()
        .map(|(i, op)| {
            format!(
                "{}. {} (type: {})",
                i + 1,
                op.operation.description,
                op.operation.kind
            )
        })
        .collect();

    ExecutionResult::ok(
        format!(
            "dry run: {} operation(s) would be executed",
            command.operations.len()
        ),
        json!({
            "operations": summary,
            "estimated_complexity": command.estimated_complexity,
            "requires_confirmation": command.requires_confirmation,
        }),
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────
