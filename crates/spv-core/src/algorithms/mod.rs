//! # Algorithms Module
//!
//! Wire codec, partial merkle verification, proof-of-work and difficulty
//! retarget rules.

pub mod difficulty;
pub mod hashing;
pub mod merkle_verifier;
pub mod proof_of_work;
pub mod wire_codec;

pub use difficulty::{check_difficulty, expected_target, verify_difficulty};
pub use hashing::{hash_pair, sha256d};
pub use merkle_verifier::{
    build_partial_merkle, check_merkle_commitment, compute_merkle_root, verify_partial_merkle,
    walk_partial_merkle,
};
pub use proof_of_work::{
    check_header, check_proof_of_work, encode_compact, expand_compact, hash_meets_target,
    is_valid, target_in_range,
};
pub use wire_codec::{decode_header, decode_merkle_block, encode_merkle_block};
