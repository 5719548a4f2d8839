//! # SPV Core
//!
//! Trust-critical validation core of a simplified payment verification
//! client.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Turn an untrusted peer's merkle block message into a trust decision
//! without downloading full blocks:
//! - 80-byte headers with a derived identity hash
//! - Partial merkle proofs revealing only matched transactions
//! - Proof-of-work against the compact target
//! - Difficulty retarget against a window of ancestors
//!
//! ## Checks
//!
//! | Check | Failure |
//! |-------|---------|
//! | Wire decoding | `MalformedMessage` |
//! | Partial merkle root | `MerkleMismatch` |
//! | Timestamp drift (2h) | `TimestampTooFarInFuture` |
//! | Compact target range | `TargetOutOfRange` |
//! | Hash under target | `ProofOfWorkInsufficient` |
//! | Retarget window | `DifficultyMismatch` |
//!
//! ## Module Structure
//!
//! ```text
//! spv-core/
//! ├── domain/          # HeaderRecord, MerkleBlock, payloads, invariants, errors
//! ├── algorithms/      # Wire codec, partial merkle, proof-of-work, retarget
//! ├── ports/           # API trait (inbound) + ancestor lookup and clock (outbound)
//! ├── application/     # HeaderValidationService
//! └── config.rs        # SpvConfig
//! ```
//!
//! ## Example
//!
//! ```
//! use spv_core::{FixedClock, HeaderValidationApi, HeaderValidationService, InMemoryAncestors, SpvConfig};
//!
//! let service = HeaderValidationService::new(
//!     SpvConfig::for_testing(),
//!     InMemoryAncestors::new(),
//!     FixedClock(1_700_000_000),
//! )
//! .unwrap();
//! assert!(service.validate_message(&[0u8; 10]).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use algorithms::{
    build_partial_merkle, check_difficulty, check_header, check_merkle_commitment,
    check_proof_of_work, compute_merkle_root, decode_merkle_block, encode_compact,
    encode_merkle_block, expand_compact, expected_target, is_valid, verify_difficulty,
    verify_partial_merkle, walk_partial_merkle,
};
pub use application::HeaderValidationService;
pub use config::{Network, RetargetConfig, SpvConfig};
pub use domain::{
    Hash, HeaderRecord, MerkleBlock, MerkleWalk, PartialMerklePayload, SpvError, StoredHeader,
    ValidatedBlock, HEADER_SIZE, MAINNET_MAX_PROOF_OF_WORK, MAX_TIME_DRIFT_SECS,
    REGTEST_MAX_PROOF_OF_WORK, RETARGET_WINDOW,
};
pub use ports::{
    AncestorLookup, FixedClock, HeaderValidationApi, InMemoryAncestors, ReferenceClock,
    SystemClock,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
