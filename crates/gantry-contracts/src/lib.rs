//! # gantry-contracts
//!
//! Shared types, schemas, and contracts for the Gantry pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod document;
pub mod error;
pub mod operation;
pub mod permission;
pub mod result;
pub mod snapshot;
pub mod violation;
