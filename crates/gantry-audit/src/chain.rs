//! Hash-chain primitives: event hashing and chain verification.
//!
//! Hash input layout (bytes, in order):
//!   1. session_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. canonical JSON of the batch record (serde_json, no pretty-printing)

use sha2::{Digest, Sha256};

use crate::event::{AuditEvent, BatchRecord};

/// Compute the SHA-256 hash for a single audit event.
///
/// The hash commits to the event's position in the chain, the session it
/// belongs to, its link to the previous event, and the full batch record.
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `record` cannot be serialized to JSON, which cannot happen for
/// the well-formed `BatchRecord` type.
pub fn hash_event(
    session_id: &str,
    sequence: u64,
    record: &BatchRecord,
    prev_hash: &str,
) -> String {
    let record_json =
        serde_json::to_vec(record).expect("BatchRecord must always be serializable to JSON");

    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    hex::encode(hasher.finalize())
}

/// Verify the integrity of a hash chain.
///
/// Valid means every event's `prev_hash` equals the `this_hash` of its
/// predecessor (or `GENESIS_HASH` for event 0) and every `this_hash`
/// matches the value recomputed from the event's own fields. An empty
/// chain is valid.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    let mut expected_prev = AuditEvent::GENESIS_HASH.to_string();

    for event in events {
        if event.prev_hash != expected_prev {
            return false;
        }

        let recomputed = hash_event(
            &event.session_id,
            event.sequence,
            &event.record,
            &event.prev_hash,
        );
        if event.this_hash != recomputed {
            return false;
        }

        expected_prev = event.this_hash.clone();
    }

    true
}
