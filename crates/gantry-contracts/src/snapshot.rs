//! Snapshot descriptor types for the rollback manager.
//!
//! A snapshot is a whole-document serialization in the host's native
//! persistence format, written to a storage slot owned by the rollback
//! manager. Descriptors are retained in an append-only, capacity-bounded
//! ordered list; the oldest is evicted (and its storage reclaimed) past the
//! configured maximum.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document metadata captured at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Number of live objects in the document.
    pub object_count: usize,
    /// Histogram of object type identifiers to counts.
    pub object_types: BTreeMap<String, usize>,
    /// Path of the originating document, when the host knows one.
    pub source_path: Option<String>,
}

/// A persisted, restorable copy of the document at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monotonically increasing slot number within one manager instance.
    pub sequence: u32,
    /// Wall-clock creation time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied description ("before delete batch", ...).
    pub description: String,
    /// Where the serialized document lives. Disjoint from the live document
    /// path; private to the owning rollback manager.
    pub storage_path: PathBuf,
    pub meta: SnapshotMeta,
}

/// A compact, serializable view of one retained snapshot, used for
/// history listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSummary {
    /// Position in the retained list; the argument to restore by index.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub object_count: usize,
}
