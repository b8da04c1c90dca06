//! # gantry-validate
//!
//! The safety validator: evaluates a syntax-checked batch against the rule
//! catalog and the current document state, producing a blocking/warning
//! verdict in a single non-short-circuiting pass.
//!
//! Also home of the session's permission ratchet: the current
//! `PermissionLevel` may only ever be raised, never lowered.

pub mod evaluator;

pub use evaluator::SafetyValidator;

// ── Tests ─────────────────────────────────────────────────────────────────────
