//! Permission levels gating which operation kinds may execute.
//!
//! A session holds exactly one current level. Levels form a total order and
//! may only ever be raised within a session; lowering requires a fresh
//! session. The ratchet itself lives in the safety validator; this module
//! only defines the ordering and the kind-to-level mapping.

use serde::{Deserialize, Serialize};

use crate::operation::OpKind;

/// An ordered capability tier.
///
/// The derived `Ord` follows declaration order, so
/// `Read < Modify < Create < Delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionLevel {
    Read,
    Modify,
    Create,
    Delete,
}

impl PermissionLevel {
    /// The level required to execute an operation of the given kind.
    ///
    /// query → Read, modify → Modify, create → Create, delete → Delete.
    pub fn required_for(kind: OpKind) -> Self {
        match kind {
            OpKind::Query => Self::Read,
            OpKind::Modify => Self::Modify,
            OpKind::Create => Self::Create,
            OpKind::Delete => Self::Delete,
        }
    }

    /// The numeric rank (1..=4) used in messages and exports.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Read => 1,
            Self::Modify => 2,
            Self::Create => 3,
            Self::Delete => 4,
        }
    }

    /// The uppercase display name used in violation messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Modify => "MODIFY",
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
