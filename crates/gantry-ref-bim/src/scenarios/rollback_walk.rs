//! Scenario 3: Snapshot and Rollback Walk.
//!
//! Creates a snapshot, mutates the document twice, then walks back:
//! undo-last restores the state before the delete, and an explicit restore
//! to the first snapshot drops every newer restore point.

use std::sync::Arc;

use serde_json::json;

use gantry_contracts::error::GantryResult;
use gantry_contracts::permission::PermissionLevel;
use gantry_core::traits::DocumentHost;
use gantry_rules::{SafetyMode, SafetyRules};
use gantry_session::Session;

use crate::host::MemoryDocumentHost;

pub fn run_scenario() -> GantryResult<()> {
    println!("=== Scenario 3: Snapshot and Rollback Walk ===");
    println!();

    let host = Arc::new(MemoryDocumentHost::with_document("/virtual/yard.json"));
    let mut session = Session::with_permission(
        host.clone(),
        SafetyRules::new(SafetyMode::Strict),
        PermissionLevel::Delete,
    )?;

    session.create_snapshot("empty yard")?;
    println!("  S0 created (objects: {})", host.object_count());

    let create = json!({
        "operations": [{
            "code": "box = doc.addObject('Part::Box', 'Crate001')",
            "description": "Place a crate",
            "type": "create",
            "affected_objects": [],
        }],
        "imports": [],
    });
    let created = session.run(&create, false, false);
    println!("  Create: {} (objects: {})", created.message, host.object_count());

    session.create_snapshot("crate placed")?;
    println!("  S1 created (objects: {})", host.object_count());

    let delete = json!({
        "operations": [{
            "code": "doc.removeObject('Crate001')",
            "description": "Remove the crate",
            "type": "delete",
            "affected_objects": ["Crate001"],
        }],
        "imports": [],
    });
    let deleted = session.run(&delete, true, false);
    println!("  Delete: {} (objects: {})", deleted.message, host.object_count());

    // Undo the delete: restore the second-most-recent snapshot, which is
    // S1 ("crate placed") because the delete's own pre-batch snapshot is
    // the most recent.
    session.rollback_last_operation()?;
    println!(
        "  Undo last operation -> objects: {} (crate is back)",
        host.object_count()
    );

    // Walk all the way back to S0. Everything newer is dropped.
    session.rollback_to_snapshot(0)?;
    println!(
        "  Restore S0 -> objects: {}, snapshots retained: {}",
        host.object_count(),
        session.snapshot_history().len()
    );

    if host.object_count() == 0 && session.snapshot_history().len() == 1 {
        println!("  RESULT: SUCCESS (expected)");
    } else {
        println!("  RESULT: unexpected outcome");
    }
    println!();
    Ok(())
}
