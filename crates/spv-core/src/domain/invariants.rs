//! # Domain Invariants
//!
//! Consensus constants and the small rules every validation path shares.

use super::errors::SpvError;

/// Size of the canonical block header serialization.
pub const HEADER_SIZE: usize = 80;

/// Size of a double-SHA-256 digest.
pub const HASH_SIZE: usize = 32;

/// Maximum distance a header timestamp may run ahead of reference time.
pub const MAX_TIME_DRIFT_SECS: u64 = 2 * 60 * 60;

/// Number of ancestors sampled by the retarget window.
pub const RETARGET_WINDOW: usize = 24;

/// Expected spacing between blocks for the retarget window.
pub const RETARGET_SPACING_SECS: u64 = 60;

/// Allowed distance between the declared and recomputed compact targets.
pub const RETARGET_TOLERANCE: u32 = 1;

/// Easiest compact target on mainnet and testnet.
pub const MAINNET_MAX_PROOF_OF_WORK: u32 = 0x1d00ffff;

/// Easiest compact target on regtest.
pub const REGTEST_MAX_PROOF_OF_WORK: u32 = 0x207fffff;

/// Height of a merkle tree with `total` leaves: `ceil(log2(total))`.
///
/// Zero and one leaf both give height 0.
pub fn tree_height(total: u32) -> u32 {
    let mut height = 0;
    while height < 32 && (1u64 << height) < u64::from(total) {
        height += 1;
    }
    height
}

/// Number of nodes at `level` above the leaves: `ceil(total / 2^level)`.
pub fn level_width(total: u32, level: u32) -> u64 {
    let total = u64::from(total);
    (total + (1u64 << level) - 1) >> level
}

/// Invariant: header timestamp is at most `max_drift` seconds past `now`.
pub fn invariant_timestamp_drift(timestamp: u32, now: u64, max_drift: u64) -> Result<(), SpvError> {
    let limit = now.saturating_add(max_drift);
    if u64::from(timestamp) > limit {
        return Err(SpvError::TimestampTooFarInFuture { timestamp, limit });
    }
    Ok(())
}

/// Invariant: declared and expected compact targets differ by at most `tolerance`.
pub fn invariant_within_tolerance(declared: u32, expected: u32, tolerance: u32) -> bool {
    declared.abs_diff(expected) <= tolerance
}
