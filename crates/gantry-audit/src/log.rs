//! The in-memory chained audit log.
//!
//! `ChainedLog` keeps all events in a `Vec` behind a `Mutex`, so a shared
//! reference can be appended to from wherever the session drives execution.
//! Records are append-only; the only removal operation is `clear`, which
//! resets the whole chain to genesis.

use std::sync::Mutex;

use chrono::Utc;
use tracing::info;

use gantry_contracts::error::{GantryError, GantryResult};

use crate::chain::{hash_event, verify_chain};
use crate::event::{AuditEvent, AuditTrail, BatchRecord};

pub(crate) struct ChainState {
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) sequence: u64,
    pub(crate) last_hash: String,
}

impl ChainState {
    fn genesis() -> Self {
        Self {
            events: Vec::new(),
            sequence: 0,
            last_hash: AuditEvent::GENESIS_HASH.to_string(),
        }
    }
}

/// An append-only, SHA-256 hash-chained audit log for one session.
pub struct ChainedLog {
    session_id: String,
    pub(crate) state: Mutex<ChainState>,
}

impl ChainedLog {
    /// Create an empty log for the given session.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            state: Mutex::new(ChainState::genesis()),
        }
    }

    /// Append one batch record to the chain.
    ///
    /// # Errors
    ///
    /// Returns `GantryError::AuditWriteFailed` only if the internal mutex is
    /// poisoned, which cannot happen under normal operation.
    pub fn append(&self, record: &BatchRecord) -> GantryResult<()> {
        let mut state = self.lock()?;

        let prev_hash = state.last_hash.clone();
        let sequence = state.sequence;
        let this_hash = hash_event(&self.session_id, sequence, record, &prev_hash);

        state.events.push(AuditEvent {
            sequence,
            session_id: self.session_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.sequence += 1;
        state.last_hash = this_hash;

        Ok(())
    }

    /// Export the full trail written so far.
    pub fn export(&self) -> AuditTrail {
        let state = self.state.lock().expect("audit state lock poisoned");
        let terminal_hash = state
            .events
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default();

        AuditTrail {
            session_id: self.session_id.clone(),
            events: state.events.clone(),
            exported_at: Utc::now(),
            terminal_hash,
        }
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("audit state lock poisoned");
        verify_chain(&state.events)
    }

    /// Number of recorded batches.
    pub fn len(&self) -> usize {
        self.state.lock().expect("audit state lock poisoned").events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every event and reset the chain to genesis.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("audit state lock poisoned");
        *state = ChainState::genesis();
        info!(session_id = %self.session_id, "audit log cleared");
    }

    fn lock(&self) -> GantryResult<std::sync::MutexGuard<'_, ChainState>> {
        self.state.lock().map_err(|e| GantryError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })
    }
}
