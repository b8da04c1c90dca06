//! Execution result and batch identity types.
//!
//! One `ExecutionResult` is produced per operation and one aggregate per
//! batch. Failure paths always carry a human-readable message and, where
//! applicable, the partial progress made; completed operations are never
//! silently discarded because a later one failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for one executed batch.
///
/// Appears in audit records so a batch's per-operation results can be
/// correlated across the execution history and the audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub uuid::Uuid);

impl BatchId {
    /// Create a new, unique batch ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A one-line trace of one operation inside a batch, kept in the execution
/// history and the audit chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationTrace {
    pub description: String,
    pub kind: crate::operation::OpKind,
    pub success: bool,
}

/// The outcome of executing one operation or one batch.
///
/// `data` is a structured payload whose shape depends on the producer: the
/// executor's aggregate result carries `executed_count`, `total_count`,
/// `execution_time`, and per-operation `results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
    pub error: Option<String>,
    /// Wall-clock time the result was produced (UTC).
    pub timestamp: DateTime<Utc>,
}

impl ExecutionResult {
    /// A successful result with a structured payload.
    pub fn ok(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A failed result carrying the error text and any partial-progress
    /// payload.
    pub fn failed(
        message: impl Into<String>,
        error: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            data,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}
