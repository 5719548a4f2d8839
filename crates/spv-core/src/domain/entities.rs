//! # Domain Entities
//!
//! Header records and merkle blocks as seen by an SPV client.

use super::errors::{Hash, SpvError};
use super::invariants::HEADER_SIZE;
use super::value_objects::{MerkleWalk, PartialMerklePayload, StoredHeader};
use crate::algorithms::{hashing, merkle_verifier, wire_codec};
use std::hash::{Hash as StdHash, Hasher};

/// Block header plus its derived identity hash.
///
/// The identity hash is the double SHA-256 of the 80-byte header encoding,
/// computed once in [`HeaderRecord::new`]. Height is the only field that
/// changes after construction, and only once.
#[derive(Clone, Debug)]
pub struct HeaderRecord {
    version: u32,
    prev_block_hash: Hash,
    merkle_root: Hash,
    timestamp: u32,
    target: u32,
    nonce: u32,
    height: Option<u32>,
    block_hash: Hash,
}

impl HeaderRecord {
    /// Build a record from header fields, deriving the identity hash.
    pub fn new(
        version: u32,
        prev_block_hash: Hash,
        merkle_root: Hash,
        timestamp: u32,
        target: u32,
        nonce: u32,
    ) -> Self {
        let mut record = Self {
            version,
            prev_block_hash,
            merkle_root,
            timestamp,
            target,
            nonce,
            height: None,
            block_hash: [0u8; 32],
        };
        record.block_hash = hashing::sha256d(&record.encode_header());
        record
    }

    /// Rebuild a record from persisted fields.
    ///
    /// The stored identity hash is trusted as-is; chain storage only holds
    /// headers that already passed validation.
    pub fn restore(stored: StoredHeader) -> Self {
        Self {
            version: stored.version,
            prev_block_hash: stored.prev_block_hash,
            merkle_root: stored.merkle_root,
            timestamp: stored.timestamp,
            target: stored.target,
            nonce: stored.nonce,
            height: stored.height,
            block_hash: stored.block_hash,
        }
    }

    /// Persistable form of this record.
    pub fn to_stored(&self) -> StoredHeader {
        StoredHeader {
            block_hash: self.block_hash,
            version: self.version,
            prev_block_hash: self.prev_block_hash,
            merkle_root: self.merkle_root,
            timestamp: self.timestamp,
            target: self.target,
            nonce: self.nonce,
            height: self.height,
        }
    }

    /// Canonical 80-byte header serialization (height excluded).
    pub fn encode_header(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(&self.prev_block_hash);
        out[36..68].copy_from_slice(&self.merkle_root);
        out[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        out[72..76].copy_from_slice(&self.target.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Identity hash.
    pub fn block_hash(&self) -> &Hash {
        &self.block_hash
    }

    /// Block version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Identity hash of the parent block.
    pub fn prev_block_hash(&self) -> &Hash {
        &self.prev_block_hash
    }

    /// Declared transaction merkle root.
    pub fn merkle_root(&self) -> &Hash {
        &self.merkle_root
    }

    /// Unix timestamp.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// Compact proof-of-work target.
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Nonce.
    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    /// Chain height, `None` until the block is placed in a chain.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Record the chain height.
    ///
    /// # Errors
    /// - `HeightAlreadySet` if a height was recorded before
    pub fn set_height(&mut self, height: u32) -> Result<(), SpvError> {
        if let Some(existing) = self.height {
            return Err(SpvError::HeightAlreadySet(existing));
        }
        self.height = Some(height);
        Ok(())
    }

    /// True for the all-zero identity hash (restored without a hash).
    pub fn is_degenerate(&self) -> bool {
        self.block_hash == [0u8; 32]
    }
}

impl PartialEq for HeaderRecord {
    fn eq(&self, other: &Self) -> bool {
        if self.is_degenerate() && other.is_degenerate() {
            return self.encode_header() == other.encode_header();
        }
        self.block_hash == other.block_hash
    }
}

impl Eq for HeaderRecord {}

impl StdHash for HeaderRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Degenerate records would all land in one bucket.
        if self.is_degenerate() {
            self.encode_header().hash(state);
        } else {
            self.block_hash.hash(state);
        }
    }
}

/// A header plus the optional partial merkle proof that followed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleBlock {
    /// Parsed header.
    pub header: HeaderRecord,
    /// Partial merkle proof (empty for header-only messages).
    pub payload: PartialMerklePayload,
}

impl MerkleBlock {
    /// Pair a header with its proof.
    pub fn new(header: HeaderRecord, payload: PartialMerklePayload) -> Self {
        Self { header, payload }
    }

    /// Parse a wire message. `None` if the bytes are malformed.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        wire_codec::decode_merkle_block(bytes)
    }

    /// Serialize back to wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        wire_codec::encode_merkle_block(self)
    }

    /// Identity hash of the header.
    pub fn block_hash(&self) -> &Hash {
        self.header.block_hash()
    }

    /// True when the message carried no merkle proof.
    pub fn is_header_only(&self) -> bool {
        self.payload.is_header_only()
    }

    /// Walk the partial merkle proof without checking it against the header.
    pub fn merkle_walk(&self) -> MerkleWalk {
        merkle_verifier::walk_partial_merkle(&self.payload)
    }

    /// Matched transaction hashes, in block order.
    ///
    /// Empty unless the proof reproduces the header's merkle root.
    pub fn matched_tx_hashes(&self) -> Vec<Hash> {
        merkle_verifier::check_merkle_commitment(self).unwrap_or_default()
    }

    /// True if `tx_hash` is one of the matched leaves of a proof that
    /// commits to the header.
    pub fn contains_tx_hash(&self, tx_hash: &Hash) -> bool {
        self.matched_tx_hashes().contains(tx_hash)
    }
}

/// A header that passed validation, with its matched transactions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedBlock {
    /// Validated header (height set when the chain position is known).
    pub header: HeaderRecord,
    /// Matched transaction hashes for the relevance matcher.
    pub matched_tx_hashes: Vec<Hash>,
}

impl ValidatedBlock {
    /// Identity hash of the validated header.
    pub fn block_hash(&self) -> &Hash {
        self.header.block_hash()
    }

    /// Chain height, if known.
    pub fn height(&self) -> Option<u32> {
        self.header.height()
    }

    /// True if `tx_hash` was proven to be in this block.
    pub fn contains_tx_hash(&self, tx_hash: &Hash) -> bool {
        self.matched_tx_hashes.contains(tx_hash)
    }
}
