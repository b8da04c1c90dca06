//! # gantry-audit
//!
//! Immutable, append-only, SHA-256 hash-chained audit trail for executed
//! batches.
//!
//! ## Overview
//!
//! Every batch the session executes is summarized as a `BatchRecord` and
//! appended to a `ChainedLog`. Each event links to the previous one via its
//! SHA-256 hash; tampering with any event, even a single byte, breaks the
//! chain and is detected by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gantry_audit::ChainedLog;
//!
//! let log = ChainedLog::new("session-001");
//! log.append(&batch_record)?;
//!
//! assert!(log.verify_integrity());
//! let trail = log.export();
//! ```

pub mod chain;
pub mod event;
pub mod log;

pub use chain::{hash_event, verify_chain};
pub use event::{AuditEvent, AuditTrail, BatchRecord};
pub use log::ChainedLog;

// ── Tests ─────────────────────────────────────────────────────────────────────
