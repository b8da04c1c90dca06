//! Read-only view types over the document host's object graph.

use serde::{Deserialize, Serialize};

/// One live document object, as enumerated by the host.
///
/// `depends_on` lists the names of objects this one depends on (the host's
/// outgoing dependency list). The safety validator inverts these edges to
/// warn when a delete target still has live dependents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Unique object name within the document.
    pub name: String,
    /// Host-specific type identifier, e.g. "Arch::Wall".
    pub type_id: String,
    /// Names of objects this object depends on.
    pub depends_on: Vec<String>,
}
