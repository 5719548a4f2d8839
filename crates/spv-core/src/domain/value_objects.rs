//! # Domain Value Objects
//!
//! Immutable value types for SPV validation.

use super::errors::Hash;
use serde::{Deserialize, Serialize};

/// Partial merkle proof carried after the header in a merkle block message.
///
/// `hashes` and `flags` are both ordered by the depth-first traversal of the
/// transaction tree. Flag bits are read least-significant bit first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMerklePayload {
    /// Number of transactions in the block (0 for header-only messages).
    pub total_transactions: u32,
    /// Leaf and interior hashes, depth-first.
    pub hashes: Vec<Hash>,
    /// Traversal flag bits packed into bytes.
    pub flags: Vec<u8>,
}

impl PartialMerklePayload {
    /// Payload of a header-only message.
    pub fn header_only() -> Self {
        Self::default()
    }

    /// True when no merkle commitment is carried.
    pub fn is_header_only(&self) -> bool {
        self.total_transactions == 0
    }

    /// Number of flag bits available.
    pub fn flag_bit_count(&self) -> usize {
        self.flags.len() * 8
    }

    /// Flag bit at `index`, or `None` past the end.
    pub fn flag_bit(&self, index: usize) -> Option<bool> {
        self.flags
            .get(index / 8)
            .map(|byte| byte & (1 << (index % 8)) != 0)
    }
}

/// Header fields as persisted by the chain-storage collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredHeader {
    /// Identity hash recorded when the header was first accepted.
    pub block_hash: Hash,
    /// Block version.
    pub version: u32,
    /// Identity hash of the parent block.
    pub prev_block_hash: Hash,
    /// Transaction merkle root.
    pub merkle_root: Hash,
    /// Unix timestamp.
    pub timestamp: u32,
    /// Compact proof-of-work target.
    pub target: u32,
    /// Nonce.
    pub nonce: u32,
    /// Chain height, if known.
    pub height: Option<u32>,
}

/// Outcome of a partial merkle traversal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MerkleWalk {
    /// Reconstructed root (`None` if any subtree was missing).
    pub root: Option<Hash>,
    /// Leaf hashes flagged as matches, in tree order.
    pub matched: Vec<Hash>,
    /// Hashes consumed by the traversal.
    pub hashes_used: usize,
    /// Flag bits consumed by the traversal.
    pub flag_bits_used: usize,
    /// Set when the proof ran out of flag bits or hashes.
    pub missing: bool,
}

impl MerkleWalk {
    /// True when every hash and every flag byte of `payload` was consumed.
    pub fn consumed_all(&self, payload: &PartialMerklePayload) -> bool {
        !self.missing
            && self.hashes_used == payload.hashes.len()
            && self.flag_bits_used.div_ceil(8) == payload.flags.len()
    }
}
