//! # gantry-core
//!
//! The document-host boundary and the operation executor.
//!
//! `traits::DocumentHost` specifies the external mutable-document engine at
//! its interface boundary: presence check, object enumeration, save/load,
//! recompute, and scoped script execution. `executor::OperationExecutor`
//! runs approved batches against a host under a wall-clock budget with
//! partial-failure accounting and a bounded execution history.

pub mod executor;
pub mod traits;

pub use executor::{ExecutionLogEntry, OperationExecutor};
pub use traits::{DocumentHost, ScriptOutcome, ScriptScope, SAFE_BUILTINS};
