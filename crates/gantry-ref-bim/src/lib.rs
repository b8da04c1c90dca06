//! # gantry-ref-bim
//!
//! BIM reference runtime for the Gantry safety pipeline.
//!
//! Provides `MemoryDocumentHost`, an in-memory stand-in for a real CAD
//! engine (named, typed objects with dependency lists, JSON persistence, a
//! small scoped script surface), plus three end-to-end scenarios:
//!
//! 1. **Build a Wall** — the happy path through every gate, with a dry run.
//! 2. **Guardrails** — permission denial, the mass-delete cap, and the
//!    confirmation-proof structural-delete block.
//! 3. **Snapshot and Rollback Walk** — undo-last and restore-to-snapshot.
//!
//! All data is simulated and fictional. No external engine is contacted.

pub mod host;
pub mod scenarios;

pub use host::{MemoryDocument, MemoryDocumentHost, MemoryObject};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use gantry_contracts::error::GantryError;
    use gantry_core::traits::{DocumentHost, ScriptScope};

    use crate::host::MemoryDocumentHost;

    fn scope_with(modules: &[&str]) -> ScriptScope {
        ScriptScope::for_modules(modules.iter().map(|s| s.to_string()))
    }

    // ── Script surface ────────────────────────────────────────────────────────

    #[test]
    fn test_add_object_creates_and_reports() {
        let host = MemoryDocumentHost::with_document("/virtual/t.json");
        let outcome = host
            .run_script(
                "box = doc.addObject('Part::Box', 'Box001')",
                &scope_with(&[]),
            )
            .unwrap();

        assert_eq!(outcome.created_objects, vec!["Box001"]);
        assert_eq!(host.object_count(), 1);
        assert_eq!(host.objects()[0].type_id, "Part::Box");
    }

    #[test]
    fn test_duplicate_add_fails() {
        let host = MemoryDocumentHost::with_document("/virtual/t.json");
        host.add_object("Box001", "Part::Box", &[]);

        let result = host.run_script(
            "doc.addObject('Part::Box', 'Box001')",
            &scope_with(&[]),
        );
        assert!(matches!(result, Err(GantryError::ScriptFailure { .. })));
    }

    #[test]
    fn test_remove_object_and_missing_target() {
        let host = MemoryDocumentHost::with_document("/virtual/t.json");
        host.add_object("Box001", "Part::Box", &[]);

        host.run_script("doc.removeObject('Box001')", &scope_with(&[]))
            .unwrap();
        assert_eq!(host.object_count(), 0);

        let missing = host.run_script("doc.removeObject('Box001')", &scope_with(&[]));
        match missing {
            Err(GantryError::ScriptFailure { reason }) => {
                assert!(reason.contains("no object named 'Box001'"));
            }
            other => panic!("expected ScriptFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_factory_call_respects_scope() {
        let host = MemoryDocumentHost::with_document("/virtual/t.json");

        // Arch is not bound: the statement must fail, not execute.
        let unbound = host.run_script(
            "w = Arch.makeWall(None, 200, 20, 300)",
            &scope_with(&["Part"]),
        );
        match unbound {
            Err(GantryError::ScriptFailure { reason }) => {
                assert!(reason.contains("'Arch' is not bound"));
            }
            other => panic!("expected ScriptFailure, got {:?}", other),
        }
        assert_eq!(host.object_count(), 0);

        // Bound: the factory creates a wall with a generated name.
        let outcome = host
            .run_script(
                "w = Arch.makeWall(None, 200, 20, 300)",
                &scope_with(&["Arch"]),
            )
            .unwrap();
        assert_eq!(outcome.created_objects, vec!["Wall001"]);
        assert_eq!(host.objects()[0].type_id, "Arch::Wall");
    }

    #[test]
    fn test_document_binding_respects_scope() {
        let host = MemoryDocumentHost::with_document("/virtual/t.json");
        let mut scope = scope_with(&[]);
        scope.bind_document = false;

        let result = host.run_script("doc.addObject('Part::Box', 'Box001')", &scope);
        assert!(matches!(result, Err(GantryError::ScriptFailure { .. })));
        assert_eq!(host.object_count(), 0);
    }

    #[test]
    fn test_comments_and_plain_expressions_are_ignored() {
        let host = MemoryDocumentHost::with_document("/virtual/t.json");
        let outcome = host
            .run_script("# just a comment\nx = 1\n\ncount = len(doc_names)", &scope_with(&[]))
            .unwrap();

        assert!(outcome.created_objects.is_empty());
        assert_eq!(host.object_count(), 0);
    }

    #[test]
    fn test_script_without_document_fails() {
        let host = MemoryDocumentHost::new();
        let result = host.run_script("x = 1", &scope_with(&[]));
        assert!(matches!(result, Err(GantryError::DocumentNotLoaded { .. })));
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    #[test]
    fn test_save_and_load_round_trip() {
        let host = MemoryDocumentHost::small_building();
        let before = host.object_count();

        let dir = std::env::temp_dir().join("gantry_ref_bim_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("villa_snapshot.json");

        host.save_to(&path).unwrap();
        host.close().unwrap();
        assert!(!host.is_loaded());

        host.load_from(&path).unwrap();
        assert_eq!(host.object_count(), before);
        assert!(host
            .objects()
            .iter()
            .any(|o| o.name == "Roof001" && o.depends_on.contains(&"Wall001".to_string())));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_small_building_seed() {
        let host = MemoryDocumentHost::small_building();
        assert_eq!(host.object_count(), 6);
        assert!(host.is_loaded());
        assert_eq!(host.document_path().as_deref(), Some("/virtual/villa.json"));
        let walls = host
            .objects()
            .iter()
            .filter(|o| o.type_id == "Arch::Wall")
            .count();
        assert_eq!(walls, 2);
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    #[test]
    fn test_scenarios_run_clean() {
        crate::scenarios::build_wall::run_scenario().unwrap();
        crate::scenarios::guardrails::run_scenario().unwrap();
        crate::scenarios::rollback_walk::run_scenario().unwrap();
    }
}
