//! The document-host boundary and the restricted execution namespace.
//!
//! The trust boundary is inverted relative to the candidate code: the
//! document host (the external CAD engine) is **trusted**; the script text
//! it is asked to run is **untrusted** and reaches it only after the static
//! validator and the safety validator have both passed it. The host receives
//! an explicit `ScriptScope` allow-list with every script, never ambient
//! scope.

use std::path::Path;

use serde::{Deserialize, Serialize};

use gantry_contracts::document::ObjectInfo;
use gantry_contracts::error::GantryResult;

/// The fixed safe subset of general-purpose primitives exposed to candidate
/// code: arithmetic, comparison, container construction, iteration helpers.
/// Deliberately absent: dynamic evaluation, file, process, and network
/// primitives.
pub const SAFE_BUILTINS: &[&str] = &[
    "True", "False", "None", "range", "len", "int", "float", "str", "list", "dict", "tuple",
    "set", "abs", "min", "max", "round", "sum", "sorted", "enumerate", "zip",
];

/// The capability-scoped namespace passed into every `run_script` call.
///
/// Built as an explicit allow-list of bound symbols; the host must expose
/// exactly these names to the script and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptScope {
    /// Safe general-purpose builtins, always `SAFE_BUILTINS`.
    pub builtins: Vec<String>,
    /// Document-host API modules the batch actually references.
    pub modules: Vec<String>,
    /// Whether the active document handle is bound (as `doc`).
    pub bind_document: bool,
}

impl ScriptScope {
    /// A scope exposing the safe builtins, the given modules, and the
    /// active document handle.
    pub fn for_modules(modules: impl IntoIterator<Item = String>) -> Self {
        Self {
            builtins: SAFE_BUILTINS.iter().map(|s| s.to_string()).collect(),
            modules: modules.into_iter().collect(),
            bind_document: true,
        }
    }

    /// True when the named module is bound in this scope.
    pub fn allows_module(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m == name)
    }

    /// True when the named builtin is bound in this scope.
    pub fn allows_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|b| b == name)
    }
}

/// What one script run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptOutcome {
    /// Names of document objects the script created.
    pub created_objects: Vec<String>,
}

/// The external mutable-document engine, specified at its interface
/// boundary.
///
/// Implementations are **trusted**. Methods take `&self`; hosts are shared
/// (`Arc<dyn DocumentHost>`) between the safety validator (read-only), the
/// rollback manager (save/load), and the executor (the only mutator), so
/// implementations use interior mutability.
pub trait DocumentHost: Send + Sync {
    /// True when a document is currently loaded.
    fn is_loaded(&self) -> bool;

    /// The path of the loaded document, when it has one.
    fn document_path(&self) -> Option<String>;

    /// Enumerate the live objects with their type identifiers and
    /// dependency lists.
    fn objects(&self) -> Vec<ObjectInfo>;

    /// Number of live objects.
    fn object_count(&self) -> usize {
        self.objects().len()
    }

    /// Persist the whole document to `path` in the host's native format.
    fn save_to(&self, path: &Path) -> GantryResult<()>;

    /// Replace the loaded document with the one persisted at `path`.
    fn load_from(&self, path: &Path) -> GantryResult<()>;

    /// Close the loaded document, if any.
    fn close(&self) -> GantryResult<()>;

    /// Recompute the dependency graph to propagate consistency.
    fn recompute(&self) -> GantryResult<()>;

    /// Run one operation's script under the given scope.
    ///
    /// A failure here is attributed to that operation alone; the executor
    /// converts it into the operation's failure result.
    fn run_script(&self, code: &str, scope: &ScriptScope) -> GantryResult<ScriptOutcome>;
}
