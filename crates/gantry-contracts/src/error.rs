//! Runtime error types for the Gantry pipeline.
//!
//! All fallible operations in Gantry return `GantryResult<T>`. Validation
//! findings (syntax errors, schema errors, policy violations) are NOT error
//! values: they are collected into `ValidatedCommand` and `SafetyReport` so
//! the caller sees every problem in one pass. `GantryError` is reserved for
//! failures of the machinery itself.

use thiserror::Error;

/// The unified error type for the Gantry runtime.
#[derive(Debug, Error)]
pub enum GantryError {
    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// An operation required a loaded document and none was present.
    #[error("no document loaded: {reason}")]
    DocumentNotLoaded { reason: String },

    /// A snapshot could not be created, found, or restored.
    #[error("snapshot unavailable: {reason}")]
    SnapshotUnavailable { reason: String },

    /// The document host failed to run a script operation.
    #[error("script execution failed: {reason}")]
    ScriptFailure { reason: String },

    /// The batch exceeded its wall-clock execution budget.
    #[error("execution timeout after {elapsed_secs:.2}s (max: {max_secs:.2}s)")]
    Timeout { elapsed_secs: f64, max_secs: f64 },

    /// The audit log could not persist a batch record.
    ///
    /// Treated as fatal by the session: a batch that cannot be audited is
    /// reported as failed even when its operations succeeded.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A custom rule reused a name already present in the catalog.
    #[error("duplicate rule name: '{name}'")]
    DuplicateRule { name: String },

    /// An API that requires a structurally valid command received an
    /// invalid one.
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
}

/// Convenience alias used throughout the Gantry crates.
pub type GantryResult<T> = Result<T, GantryError>;
