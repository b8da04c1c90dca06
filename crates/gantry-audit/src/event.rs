//! Audit event and trail types.
//!
//! `BatchRecord` summarizes one executed batch. `AuditEvent` wraps a record
//! with sequence numbering and the SHA-256 hashes that make tampering
//! detectable; `AuditTrail` is the exported view of a whole session's
//! chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gantry_contracts::result::{BatchId, OperationTrace};

/// The audit summary of one executed batch.
///
/// One record is appended per batch, whatever its outcome: full success,
/// partial success, total failure, or timeout abort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_id: BatchId,
    /// Wall-clock time the batch finished (UTC).
    pub timestamp: DateTime<Utc>,
    pub operation_count: usize,
    pub executed_count: usize,
    pub failure_count: usize,
    pub elapsed_ms: u64,
    /// Per-operation success flags in execution order.
    pub operations: Vec<OperationTrace>,
}

/// A single entry in the hash chain for one session.
///
/// Each event commits to the previous event via `prev_hash`, forming an
/// append-only chain. Modifying any field, including those of the embedded
/// record, invalidates `this_hash` and every subsequent `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Monotonically increasing position in the chain, starting at 0.
    pub sequence: u64,
    /// The session this event belongs to.
    pub session_id: String,
    pub record: BatchRecord,
    /// SHA-256 hash (hex) of the previous event, or `GENESIS_HASH` for the
    /// first event.
    pub prev_hash: String,
    /// SHA-256 hash (hex) of this event's canonical content.
    pub this_hash: String,
}

impl AuditEvent {
    /// The sentinel `prev_hash` used for the first event in every chain:
    /// 64 hex zeros, a value that can never be the SHA-256 of real data.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// The exported view of a session's audit chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrail {
    pub session_id: String,
    /// All audit events in chain order (sequence 0 first).
    pub events: Vec<AuditEvent>,
    /// Wall-clock time (UTC) the trail was exported.
    pub exported_at: DateTime<Utc>,
    /// The `this_hash` of the last event; empty string for an empty trail.
    pub terminal_hash: String,
}
