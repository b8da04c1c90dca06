//! # gantry-rollback
//!
//! Snapshot-based rollback for the Gantry pipeline.
//!
//! A `RollbackManager` persists whole-document snapshots through the host's
//! save/load primitives into a private temporary directory, retains a
//! bounded, time-ordered list of them, and can restore any retained
//! snapshot. Restoring drops every newer snapshot: the future relative to a
//! restore point cannot be redone.

pub mod manager;

pub use manager::{RollbackManager, DEFAULT_MAX_SNAPSHOTS};

// ── Tests ─────────────────────────────────────────────────────────────────────
