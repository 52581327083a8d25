//! Content hashing for dirty detection.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest over a raw payload.
///
/// Deterministic for identical byte sequences; the state cache compares
/// these digests to decide whether a persisted payload must be rewritten.
#[must_use]
pub fn content_hash(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    format!("{:x}", hasher.finalize())
}
