//! Hashing utilities shared by header identity and merkle branches.

use crate::domain::Hash;
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute double SHA-256 hash
#[inline]
pub fn sha256d(data: &[u8]) -> Hash {
    let first_hash = sha256(data);
    sha256(&first_hash)
}

/// Merkle branch value: `sha256d(left || right)`.
#[inline]
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut concat = [0u8; 64];
    concat[..32].copy_from_slice(left);
    concat[32..].copy_from_slice(right);
    sha256d(&concat)
}
