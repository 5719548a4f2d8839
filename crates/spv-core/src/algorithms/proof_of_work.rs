//! # Proof-of-Work Validation
//!
//! Compact target encoding and the header proof-of-work predicate.
//!
//! A compact target packs a 256-bit threshold into 32 bits:
//!
//! ```text
//! size(8) | sign(1) | mantissa(23)
//! value = mantissa * 256^(size - 3)
//! ```
//!
//! **Target is a CEILING**: the identity hash, read as a little-endian
//! 256-bit number, must be less than or equal to the expanded target.

use crate::config::SpvConfig;
use crate::domain::{invariant_timestamp_drift, Hash, HeaderRecord, SpvError};
use primitive_types::U256;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

fn split_compact(compact: u32) -> (u32, u32) {
    (compact >> 24, compact & MANTISSA_MASK)
}

/// Check a compact target against the network's easiest target.
///
/// Rejects a zero mantissa, a set sign bit, a size above the maximum size,
/// and a mantissa above the maximum mantissa at the maximum size.
pub fn target_in_range(compact: u32, max_proof_of_work: u32) -> bool {
    let (size, mantissa) = split_compact(compact);
    let (max_size, max_mantissa) = split_compact(max_proof_of_work);

    mantissa != 0
        && compact & SIGN_BIT == 0
        && size <= max_size
        && !(size == max_size && mantissa > max_mantissa)
}

/// Expand a compact target into its 256-bit value.
///
/// The sign bit is ignored. Returns `None` if the value does not fit in
/// 256 bits.
pub fn expand_compact(compact: u32) -> Option<U256> {
    let (size, mantissa) = split_compact(compact);

    if size <= 3 {
        return Some(U256::from(mantissa >> (8 * (3 - size))));
    }

    let shift = 8 * (size as usize - 3);
    let mantissa = U256::from(mantissa);
    if mantissa.is_zero() {
        return Some(U256::zero());
    }
    if mantissa.bits() + shift > 256 {
        return None;
    }
    Some(mantissa << shift)
}

/// Encode a 256-bit value as a compact target (inverse of [`expand_compact`]).
///
/// Precision below the top three significant bytes is truncated. A mantissa
/// that would set the sign bit is shifted down one byte and the size grown.
pub fn encode_compact(value: U256) -> u32 {
    let mut size = value.bits().div_ceil(8) as u32;
    let mut mantissa = if size <= 3 {
        (value.low_u64() << (8 * (3 - size))) as u32
    } else {
        (value >> (8 * (size as usize - 3))).low_u32()
    };

    if mantissa & SIGN_BIT != 0 {
        mantissa >>= 8;
        size += 1;
    }

    mantissa | (size << 24)
}

/// Compare a hash against an expanded target, one 32-bit word at a time
/// from the most significant word down.
///
/// The first differing word decides; equal values pass.
pub fn hash_meets_target(hash: &Hash, target: &U256) -> bool {
    let mut target_bytes = [0u8; 32];
    target.to_little_endian(&mut target_bytes);

    for word in (0..8).rev() {
        let range = word * 4..word * 4 + 4;
        let hash_word = u32::from_le_bytes([
            hash[range.start],
            hash[range.start + 1],
            hash[range.start + 2],
            hash[range.start + 3],
        ]);
        let target_word = u32::from_le_bytes([
            target_bytes[range.start],
            target_bytes[range.start + 1],
            target_bytes[range.start + 2],
            target_bytes[range.start + 3],
        ]);
        if hash_word != target_word {
            return hash_word < target_word;
        }
    }
    true
}

/// Check the header's compact target range and its proof of work.
///
/// # Errors
/// - `TargetOutOfRange` if the compact target is malformed or too easy
/// - `ProofOfWorkInsufficient` if the identity hash is above the target
pub fn check_proof_of_work(header: &HeaderRecord, max_proof_of_work: u32) -> Result<(), SpvError> {
    let target = header.target();
    let out_of_range = SpvError::TargetOutOfRange {
        target,
        max: max_proof_of_work,
    };

    if !target_in_range(target, max_proof_of_work) {
        return Err(out_of_range);
    }
    let expanded = expand_compact(target).ok_or(out_of_range)?;

    if !hash_meets_target(header.block_hash(), &expanded) {
        return Err(SpvError::ProofOfWorkInsufficient { target });
    }
    Ok(())
}

/// Full header predicate: timestamp drift, target range, proof of work.
///
/// `now` is the reference time in unix seconds.
///
/// # Errors
/// - `TimestampTooFarInFuture`, `TargetOutOfRange` or
///   `ProofOfWorkInsufficient`, in that order of precedence
pub fn check_header(header: &HeaderRecord, now: u64, config: &SpvConfig) -> Result<(), SpvError> {
    invariant_timestamp_drift(header.timestamp(), now, config.max_time_drift_secs)?;
    check_proof_of_work(header, config.max_proof_of_work())
}

/// Boolean form of [`check_header`].
pub fn is_valid(header: &HeaderRecord, now: u64, config: &SpvConfig) -> bool {
    check_header(header, now, config).is_ok()
}
