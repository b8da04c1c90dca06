//! The rollback manager: point-in-time snapshots and restoration.
//!
//! Each manager owns a private temporary directory for its snapshot slots;
//! that storage is disjoint from the live document path and is reclaimed
//! when the manager is dropped or `clear_snapshots` is called. The retained
//! descriptor list is always ordered by creation time and bounded by
//! `max_snapshots` (oldest evicted first).
//!
//! Restoring invalidates the future: every snapshot newer than the restored
//! one is dropped, so there is no redo past a restore point.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use gantry_contracts::error::{GantryError, GantryResult};
use gantry_contracts::snapshot::{Snapshot, SnapshotMeta, SnapshotSummary};
use gantry_core::traits::DocumentHost;

/// Default number of retained snapshots.
pub const DEFAULT_MAX_SNAPSHOTS: usize = 10;

/// Creates and restores whole-document snapshots through the host's
/// save/load primitives.
pub struct RollbackManager {
    host: Arc<dyn DocumentHost>,
    max_snapshots: usize,
    snapshots: Vec<Snapshot>,
    storage: TempDir,
    counter: u32,
}

impl RollbackManager {
    /// Create a manager with the default capacity.
    pub fn new(host: Arc<dyn DocumentHost>) -> GantryResult<Self> {
        Self::with_capacity(host, DEFAULT_MAX_SNAPSHOTS)
    }

    /// Create a manager retaining at most `max_snapshots` snapshots.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::Config` when the private storage directory
    /// cannot be created.
    pub fn with_capacity(host: Arc<dyn DocumentHost>, max_snapshots: usize) -> GantryResult<Self> {
        let storage = tempfile::Builder::new()
            .prefix("gantry_rollback_")
            .tempdir()
            .map_err(|e| GantryError::Config {
                reason: format!("failed to create snapshot storage: {}", e),
            })?;

        info!(storage = %storage.path().display(), "rollback manager initialized");

        Ok(Self {
            host,
            max_snapshots,
            snapshots: Vec::new(),
            storage,
            counter: 0,
        })
    }

    /// Persist the current document state to a new snapshot slot.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::SnapshotUnavailable` when no document is
    /// loaded, or the host's error when saving fails.
    pub fn create_snapshot(&mut self, description: &str) -> GantryResult<Snapshot> {
        if !self.host.is_loaded() {
            warn!("no document loaded, cannot create snapshot");
            return Err(GantryError::SnapshotUnavailable {
                reason: "no document loaded".to_string(),
            });
        }

        self.counter += 1;
        let slot = self
            .storage
            .path()
            .join(format!("snapshot_{:04}.snap", self.counter));

        self.host.save_to(&slot)?;

        let objects = self.host.objects();
        let mut object_types: BTreeMap<String, usize> = BTreeMap::new();
        for obj in &objects {
            *object_types.entry(obj.type_id.clone()).or_insert(0) += 1;
        }

        let snapshot = Snapshot {
            sequence: self.counter,
            timestamp: Utc::now(),
            description: description.to_string(),
            storage_path: slot,
            meta: SnapshotMeta {
                object_count: objects.len(),
                object_types,
                source_path: self.host.document_path(),
            },
        };

        self.snapshots.push(snapshot.clone());
        self.evict_beyond_capacity();

        info!(
            description = %snapshot.description,
            sequence = snapshot.sequence,
            retained = self.snapshots.len(),
            "snapshot created"
        );
        Ok(snapshot)
    }

    /// Restore the document to the snapshot at `index` in the retained list.
    ///
    /// On success, every snapshot newer than the restored one is dropped.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::SnapshotUnavailable` when the index is out of
    /// range. A failed load propagates the host's error without truncating
    /// the retained list.
    pub fn rollback_to_snapshot(&mut self, index: usize) -> GantryResult<()> {
        let snapshot = self.snapshots.get(index).ok_or_else(|| {
            GantryError::SnapshotUnavailable {
                reason: format!(
                    "no snapshot at index {} ({} retained)",
                    index,
                    self.snapshots.len()
                ),
            }
        })?;
        let slot = snapshot.storage_path.clone();

        info!(index, description = %snapshot.description, "rolling back to snapshot");

        if self.host.is_loaded() {
            self.host.close()?;
        }
        self.host.load_from(&slot)?;

        // The restore point is now the newest retained state.
        let dropped = self.snapshots.len() - (index + 1);
        for stale in self.snapshots.drain(index + 1..) {
            remove_slot(&stale);
        }
        if dropped > 0 {
            debug!(dropped, "dropped snapshots newer than the restore point");
        }

        info!("rollback successful");
        Ok(())
    }

    /// Undo the most recent change by restoring the second-most-recent
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::SnapshotUnavailable` when fewer than two
    /// snapshots are retained.
    pub fn rollback_last_operation(&mut self) -> GantryResult<()> {
        if self.snapshots.len() < 2 {
            return Err(GantryError::SnapshotUnavailable {
                reason: "need at least 2 snapshots to undo the last operation".to_string(),
            });
        }
        self.rollback_to_snapshot(self.snapshots.len() - 2)
    }

    /// True when at least one snapshot is available to restore.
    pub fn can_rollback(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// The retained snapshots, oldest first.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Index of the most recent snapshot, when any are retained.
    pub fn current_index(&self) -> Option<usize> {
        self.snapshots.len().checked_sub(1)
    }

    /// Compact history listing for display.
    pub fn history(&self) -> Vec<SnapshotSummary> {
        self.snapshots
            .iter()
            .enumerate()
            .map(|(index, snap)| SnapshotSummary {
                index,
                timestamp: snap.timestamp,
                description: snap.description.clone(),
                object_count: snap.meta.object_count,
            })
            .collect()
    }

    /// Total bytes currently used by snapshot storage.
    pub fn storage_size(&self) -> u64 {
        self.snapshots
            .iter()
            .filter_map(|snap| std::fs::metadata(&snap.storage_path).ok())
            .map(|meta| meta.len())
            .sum()
    }

    /// Drop every snapshot and reclaim its storage.
    pub fn clear_snapshots(&mut self) {
        for snapshot in self.snapshots.drain(..) {
            remove_slot(&snapshot);
        }
        self.counter = 0;
        info!("all snapshots cleared");
    }

    fn evict_beyond_capacity(&mut self) {
        while self.snapshots.len() > self.max_snapshots {
            let oldest = self.snapshots.remove(0);
            debug!(
                sequence = oldest.sequence,
                "evicting oldest snapshot past capacity"
            );
            remove_slot(&oldest);
        }
    }
}

/// Delete one snapshot's storage file. Best effort: a missing file is not
/// an error once the descriptor is gone.
fn remove_slot(snapshot: &Snapshot) {
    if let Err(e) = std::fs::remove_file(&snapshot.storage_path) {
        warn!(
            path = %snapshot.storage_path.display(),
            error = %e,
            "failed to remove snapshot file"
        );
    }
}
