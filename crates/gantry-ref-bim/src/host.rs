//! An in-memory document host with a BIM-flavored object model.
//!
//! The document is a list of named, typed objects with dependency lists,
//! persisted as JSON (this host's native format). `run_script` interprets
//! the small script surface the reference scenarios use and honors the
//! `ScriptScope` allow-list: a statement touching `doc` or a module that is
//! not bound in the scope fails instead of executing.
//!
//! This host is a stand-in for a real CAD engine. All behavior is
//! simulated; nothing outside the process is touched except snapshot files
//! written through `save_to`.

use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use gantry_contracts::document::ObjectInfo;
use gantry_contracts::error::{GantryError, GantryResult};
use gantry_core::traits::{DocumentHost, ScriptOutcome, ScriptScope};

/// One simulated document object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryObject {
    pub name: String,
    pub type_id: String,
    pub depends_on: Vec<String>,
}

/// The whole simulated document, serializable as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    pub path: Option<String>,
    pub objects: Vec<MemoryObject>,
    /// Counter for generated object names (Wall001, Box002, ...).
    pub next_id: u32,
}

/// Factory calls the script surface understands, mapped to the object they
/// create.
const FACTORIES: &[(&str, &str, &str)] = &[
    ("makeWall(", "Arch::Wall", "Wall"),
    ("makeStructure(", "Arch::Structure", "Column"),
    ("makeFloor(", "Arch::Floor", "Floor"),
    ("makeWindow(", "Arch::Window", "Window"),
    ("makeBox(", "Part::Box", "Box"),
];

/// The in-memory reference host.
pub struct MemoryDocumentHost {
    document: Mutex<Option<MemoryDocument>>,
    recomputes: Mutex<u64>,
}

impl MemoryDocumentHost {
    /// A host with no document loaded.
    pub fn new() -> Self {
        Self {
            document: Mutex::new(None),
            recomputes: Mutex::new(0),
        }
    }

    /// A host with a fresh, empty document.
    pub fn with_document(path: &str) -> Self {
        let host = Self::new();
        *host.document.lock().expect("document lock poisoned") = Some(MemoryDocument {
            path: Some(path.to_string()),
            objects: Vec::new(),
            next_id: 1,
        });
        host
    }

    /// A host seeded with a small mock building: two walls, a column, and
    /// dependent roof, window, and door elements.
    pub fn small_building() -> Self {
        let host = Self::with_document("/virtual/villa.json");
        host.add_object("Wall001", "Arch::Wall", &[]);
        host.add_object("Wall002", "Arch::Wall", &[]);
        host.add_object("Column001", "Arch::Structure", &[]);
        host.add_object("Roof001", "Arch::Roof", &["Wall001", "Wall002"]);
        host.add_object("Window001", "Arch::Window", &["Wall001"]);
        host.add_object("Door001", "Arch::Door", &["Wall002"]);
        // Generated factory names must not collide with the seeded ones.
        if let Some(doc) = host
            .document
            .lock()
            .expect("document lock poisoned")
            .as_mut()
        {
            doc.next_id = 100;
        }
        host
    }

    /// Insert an object directly, bypassing the script surface. Intended
    /// for seeding test and scenario fixtures.
    pub fn add_object(&self, name: &str, type_id: &str, depends_on: &[&str]) {
        let mut guard = self.document.lock().expect("document lock poisoned");
        if let Some(doc) = guard.as_mut() {
            doc.objects.push(MemoryObject {
                name: name.to_string(),
                type_id: type_id.to_string(),
                depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    /// How many times `recompute` has run.
    pub fn recompute_count(&self) -> u64 {
        *self.recomputes.lock().expect("recompute lock poisoned")
    }

    // ── Script interpretation ─────────────────────────────────────────────────

    fn execute_statement(
        doc: &mut MemoryDocument,
        statement: &str,
        scope: &ScriptScope,
        created: &mut Vec<String>,
    ) -> GantryResult<()> {
        if let Some(call) = statement.strip_prefix("doc.") {
            if !scope.bind_document {
                return Err(GantryError::ScriptFailure {
                    reason: "'doc' is not bound in the execution scope".to_string(),
                });
            }
            return Self::execute_document_call(doc, call, created);
        }

        if let Some((module, call)) = statement.split_once('.') {
            if is_identifier(module) {
                if !scope.allows_module(module) {
                    return Err(GantryError::ScriptFailure {
                        reason: format!("module '{}' is not bound in the execution scope", module),
                    });
                }
                return Self::execute_module_call(doc, call, created);
            }
        }

        // Plain expressions and assignments without document effect.
        debug!(statement, "ignoring side-effect-free statement");
        Ok(())
    }

    fn execute_document_call(
        doc: &mut MemoryDocument,
        call: &str,
        created: &mut Vec<String>,
    ) -> GantryResult<()> {
        if call.starts_with("addObject(") {
            let args = quoted_args(call);
            if args.len() < 2 {
                return Err(GantryError::ScriptFailure {
                    reason: "addObject requires a type and a name".to_string(),
                });
            }
            let (type_id, name) = (&args[0], &args[1]);
            if doc.objects.iter().any(|o| &o.name == name) {
                return Err(GantryError::ScriptFailure {
                    reason: format!("object '{}' already exists", name),
                });
            }
            doc.objects.push(MemoryObject {
                name: name.clone(),
                type_id: type_id.clone(),
                depends_on: vec![],
            });
            created.push(name.clone());
            return Ok(());
        }

        if call.starts_with("removeObject(") {
            let args = quoted_args(call);
            let name = args.first().ok_or_else(|| GantryError::ScriptFailure {
                reason: "removeObject requires an object name".to_string(),
            })?;
            let position = doc
                .objects
                .iter()
                .position(|o| &o.name == name)
                .ok_or_else(|| GantryError::ScriptFailure {
                    reason: format!("no object named '{}'", name),
                })?;
            doc.objects.remove(position);
            return Ok(());
        }

        if call.starts_with("recompute(") {
            // The executor triggers the real recompute once per batch; an
            // in-script call is accepted and ignored.
            return Ok(());
        }

        Err(GantryError::ScriptFailure {
            reason: format!("unsupported document call: doc.{}", call),
        })
    }

    fn execute_module_call(
        doc: &mut MemoryDocument,
        call: &str,
        created: &mut Vec<String>,
    ) -> GantryResult<()> {
        for (marker, type_id, base) in FACTORIES {
            if call.starts_with(marker) {
                let name = format!("{}{:03}", base, doc.next_id);
                doc.next_id += 1;
                doc.objects.push(MemoryObject {
                    name: name.clone(),
                    type_id: type_id.to_string(),
                    depends_on: vec![],
                });
                created.push(name);
                return Ok(());
            }
        }

        // Non-factory module calls (queries, display helpers) have no
        // document effect in the simulation.
        debug!(call, "ignoring non-factory module call");
        Ok(())
    }
}

impl Default for MemoryDocumentHost {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentHost for MemoryDocumentHost {
    fn is_loaded(&self) -> bool {
        self.document
            .lock()
            .expect("document lock poisoned")
            .is_some()
    }

    fn document_path(&self) -> Option<String> {
        self.document
            .lock()
            .expect("document lock poisoned")
            .as_ref()
            .and_then(|doc| doc.path.clone())
    }

    fn objects(&self) -> Vec<ObjectInfo> {
        self.document
            .lock()
            .expect("document lock poisoned")
            .as_ref()
            .map(|doc| {
                doc.objects
                    .iter()
                    .map(|o| ObjectInfo {
                        name: o.name.clone(),
                        type_id: o.type_id.clone(),
                        depends_on: o.depends_on.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn save_to(&self, path: &Path) -> GantryResult<()> {
        let guard = self.document.lock().expect("document lock poisoned");
        let doc = guard.as_ref().ok_or_else(|| GantryError::DocumentNotLoaded {
            reason: "cannot save without a document".to_string(),
        })?;
        let json = serde_json::to_vec_pretty(doc).map_err(|e| GantryError::ScriptFailure {
            reason: format!("failed to serialize document: {}", e),
        })?;
        std::fs::write(path, json).map_err(|e| GantryError::SnapshotUnavailable {
            reason: format!("failed to write snapshot '{}': {}", path.display(), e),
        })
    }

    fn load_from(&self, path: &Path) -> GantryResult<()> {
        let bytes = std::fs::read(path).map_err(|e| GantryError::SnapshotUnavailable {
            reason: format!("failed to read snapshot '{}': {}", path.display(), e),
        })?;
        let doc: MemoryDocument =
            serde_json::from_slice(&bytes).map_err(|e| GantryError::SnapshotUnavailable {
                reason: format!("snapshot '{}' is not a valid document: {}", path.display(), e),
            })?;
        *self.document.lock().expect("document lock poisoned") = Some(doc);
        Ok(())
    }

    fn close(&self) -> GantryResult<()> {
        *self.document.lock().expect("document lock poisoned") = None;
        Ok(())
    }

    fn recompute(&self) -> GantryResult<()> {
        *self.recomputes.lock().expect("recompute lock poisoned") += 1;
        Ok(())
    }

    fn run_script(&self, code: &str, scope: &ScriptScope) -> GantryResult<ScriptOutcome> {
        let mut guard = self.document.lock().expect("document lock poisoned");
        let doc = guard.as_mut().ok_or_else(|| GantryError::DocumentNotLoaded {
            reason: "no document loaded".to_string(),
        })?;

        let mut created = Vec::new();
        for raw_line in code.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let statement = match line.split_once(" = ") {
                Some((target, rhs)) if is_identifier(target) => rhs.trim(),
                _ => line,
            };
            Self::execute_statement(doc, statement, scope, &mut created)?;
        }

        Ok(ScriptOutcome {
            created_objects: created,
        })
    }
}

/// True for a plain name: letters, digits, underscores, not starting with a
/// digit.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The quoted string arguments of a call, in order.
fn quoted_args(call: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in call.chars() {
        match quote {
            Some(q) if c == q => {
                args.push(std::mem::take(&mut current));
                quote = None;
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None => {}
        }
    }
    args
}
