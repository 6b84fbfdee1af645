//! SHA-256 hashing for content addressing.
//!
//! Serializers in this workspace are deterministic, so hashing their output is
//! a stable way to compare collections.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 hash of in-memory data.
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
