//! # Partial Merkle Verification
//!
//! Depth-first reconstruction of a merkle root from a partial merkle proof,
//! extracting the matched leaves on the way.
//!
//! # Algorithm
//!
//! At each node read the next flag bit:
//! - bit 0, or leaf level: the node's value is the next hash; it is a
//!   matched leaf if the bit was 1
//! - bit 1 above the leaf level: recurse left then right, duplicating the
//!   left value when the right child falls outside the level's width
//!
//! Running out of flag bits or hashes marks the subtree missing; the walk
//! still terminates and the root comes back as `None`.
//!
//! # Time Complexity: O(number of tree nodes visited)

use super::hashing::hash_pair;
use crate::domain::{
    level_width, tree_height, Hash, MerkleBlock, MerkleWalk, PartialMerklePayload, SpvError,
};

/// Position of a node: depth from the root, index within its level.
#[derive(Clone, Copy, Debug)]
struct Node {
    depth: u32,
    position: u64,
}

/// Cursors and accumulators threaded through the walk.
#[derive(Debug, Default)]
struct WalkState {
    hash_index: usize,
    flag_index: usize,
    matched: Vec<Hash>,
    missing: bool,
}

struct Traversal<'a> {
    payload: &'a PartialMerklePayload,
    height: u32,
}

impl Traversal<'_> {
    fn walk(&self, node: Node, mut state: WalkState) -> (Option<Hash>, WalkState) {
        let Some(flag) = self.payload.flag_bit(state.flag_index) else {
            state.missing = true;
            return (None, state);
        };
        state.flag_index += 1;

        if !flag || node.depth == self.height {
            let Some(hash) = self.payload.hashes.get(state.hash_index).copied() else {
                state.missing = true;
                return (None, state);
            };
            state.hash_index += 1;
            if flag {
                state.matched.push(hash);
            }
            return (Some(hash), state);
        }

        let child_depth = node.depth + 1;
        let (left, state) = self.walk(
            Node {
                depth: child_depth,
                position: node.position * 2,
            },
            state,
        );

        let right_position = node.position * 2 + 1;
        let child_width = level_width(self.payload.total_transactions, self.height - child_depth);
        let (right, state) = if right_position < child_width {
            self.walk(
                Node {
                    depth: child_depth,
                    position: right_position,
                },
                state,
            )
        } else {
            (left, state)
        };

        let value = match (left, right) {
            (Some(left), Some(right)) => Some(hash_pair(&left, &right)),
            _ => None,
        };
        (value, state)
    }
}

/// Walk a partial merkle proof.
///
/// Header-only payloads yield an empty walk with no root.
pub fn walk_partial_merkle(payload: &PartialMerklePayload) -> MerkleWalk {
    if payload.is_header_only() {
        return MerkleWalk::default();
    }

    let traversal = Traversal {
        payload,
        height: tree_height(payload.total_transactions),
    };
    let (root, state) = traversal.walk(
        Node {
            depth: 0,
            position: 0,
        },
        WalkState::default(),
    );

    MerkleWalk {
        root,
        matched: state.matched,
        hashes_used: state.hash_index,
        flag_bits_used: state.flag_index,
        missing: state.missing,
    }
}

/// Verify that `payload` commits to `declared_root`.
///
/// Header-only payloads carry no commitment and always pass. Otherwise the
/// reconstructed root must match and the proof must be consumed exactly.
pub fn verify_partial_merkle(payload: &PartialMerklePayload, declared_root: &Hash) -> bool {
    if payload.is_header_only() {
        return true;
    }
    let walk = walk_partial_merkle(payload);
    walk.root.as_ref() == Some(declared_root) && walk.consumed_all(payload)
}

/// Check a merkle block's proof against its header.
///
/// Returns the matched transaction hashes on success.
///
/// # Errors
/// - `MerkleMismatch` if the proof does not reproduce the header's root
pub fn check_merkle_commitment(block: &MerkleBlock) -> Result<Vec<Hash>, SpvError> {
    if block.is_header_only() {
        return Ok(Vec::new());
    }

    let walk = walk_partial_merkle(&block.payload);
    let declared = block.header.merkle_root();
    if walk.root.as_ref() != Some(declared) || !walk.consumed_all(&block.payload) {
        return Err(SpvError::MerkleMismatch {
            declared: *declared,
            reconstructed: walk.root,
        });
    }
    Ok(walk.matched)
}

/// Build a merkle tree from transaction hashes.
///
/// Returns the Merkle root hash (all zeros for an empty list).
pub fn compute_merkle_root(tx_hashes: &[Hash]) -> Hash {
    if tx_hashes.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<Hash> = tx_hashes.to_vec();

    while level.len() > 1 {
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));

        for chunk in level.chunks(2) {
            let left = &chunk[0];
            let right = chunk.get(1).unwrap_or(left); // Duplicate last if odd
            next_level.push(hash_pair(left, right));
        }

        level = next_level;
    }

    level[0]
}

/// Full-node side of the protocol: build the partial merkle proof revealing
/// every transaction whose `matches` entry is true.
///
/// Missing `matches` entries count as unmatched. Returns a header-only
/// payload for an empty transaction list or one longer than `u32::MAX`.
pub fn build_partial_merkle(tx_hashes: &[Hash], matches: &[bool]) -> PartialMerklePayload {
    let Ok(total) = u32::try_from(tx_hashes.len()) else {
        return PartialMerklePayload::header_only();
    };
    if total == 0 {
        return PartialMerklePayload::header_only();
    }

    let builder = ProofBuilder {
        tx_hashes,
        matches,
        total,
    };
    let mut bits = Vec::new();
    let mut hashes = Vec::new();
    builder.build(tree_height(total), 0, &mut bits, &mut hashes);

    let mut flags = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            flags[i / 8] |= 1 << (i % 8);
        }
    }

    PartialMerklePayload {
        total_transactions: total,
        hashes,
        flags,
    }
}

struct ProofBuilder<'a> {
    tx_hashes: &'a [Hash],
    matches: &'a [bool],
    total: u32,
}

impl ProofBuilder<'_> {
    /// Value of the node at `level` above the leaves.
    fn node_hash(&self, level: u32, position: u64) -> Hash {
        if level == 0 {
            return self.tx_hashes[position as usize];
        }
        let left = self.node_hash(level - 1, position * 2);
        let right = if position * 2 + 1 < level_width(self.total, level - 1) {
            self.node_hash(level - 1, position * 2 + 1)
        } else {
            left
        };
        hash_pair(&left, &right)
    }

    fn subtree_has_match(&self, level: u32, position: u64) -> bool {
        let start = (position << level) as usize;
        let end = (((position + 1) << level) as usize).min(self.tx_hashes.len());
        (start..end).any(|i| self.matches.get(i).copied().unwrap_or(false))
    }

    fn build(&self, level: u32, position: u64, bits: &mut Vec<bool>, hashes: &mut Vec<Hash>) {
        let has_match = self.subtree_has_match(level, position);
        bits.push(has_match);

        if level == 0 || !has_match {
            hashes.push(self.node_hash(level, position));
            return;
        }

        self.build(level - 1, position * 2, bits, hashes);
        if position * 2 + 1 < level_width(self.total, level - 1) {
            self.build(level - 1, position * 2 + 1, bits, hashes);
        }
    }
}
