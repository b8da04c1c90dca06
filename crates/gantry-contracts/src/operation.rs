//! Candidate operation types.
//!
//! An `Operation` is one proposed unit of work produced by the translator
//! collaborator: script text in the document host's scripting surface plus
//! routing metadata. Operations are immutable once decoded; the validator
//! and executor only ever read them.

use serde::{Deserialize, Serialize};

/// The four kinds of work an operation may perform against the document.
///
/// The kind drives permission gating: each kind maps to a required
/// `PermissionLevel` via `PermissionLevel::required_for()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Create,
    Modify,
    Delete,
    Query,
}

impl OpKind {
    /// Parse the translator's lowercase type string.
    ///
    /// Returns `None` for anything outside the known vocabulary; the static
    /// validator reports that as a schema error rather than guessing.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            "query" => Some(Self::Query),
            _ => None,
        }
    }

    /// The lowercase wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
            Self::Query => "query",
        }
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed unit of work awaiting validation.
///
/// `affected_objects` is the translator's best guess at which document
/// objects the code touches. It may be empty or approximate; the safety
/// validator falls back to syntax-tree inference when it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Script source text in the document host's scripting surface.
    pub code: String,
    /// Human-readable summary, used in plans, violations, and audit records.
    pub description: String,
    /// What kind of work this operation performs.
    pub kind: OpKind,
    /// Object identifiers the operation claims to affect (may be empty).
    pub affected_objects: Vec<String>,
}
