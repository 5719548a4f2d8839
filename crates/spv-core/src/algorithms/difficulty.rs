//! # Difficulty Retarget Validation
//!
//! Recomputes the expected compact target from a window of ancestors and
//! compares it with the target a header declares.
//!
//! ## Rule
//!
//! Starting at the predecessor, sample up to `window` headers:
//!
//! ```text
//! sum      = 2 * target[0] + target[1] + ... + target[n-1]
//! average  = sum / (n + 1)
//! timespan = (n - 1) * spacing
//! actual   = clamp(timestamp[0] - timestamp[n-1], timespan / 3, timespan * 3)
//! expected = min(average * actual / timespan, network maximum)
//! ```
//!
//! **REMEMBER**: target is a CEILING. Fast blocks shrink `actual` and lower
//! the expected target, making the next block harder.
//!
//! A window that cannot be filled (short chain, missing predecessor or
//! ancestor) accepts only the network's maximum target.

use super::proof_of_work::{encode_compact, expand_compact};
use crate::config::SpvConfig;
use crate::domain::{invariant_within_tolerance, HeaderRecord, SpvError};
use crate::ports::AncestorLookup;
use primitive_types::{U256, U512};

/// Compact target the retarget window requires after `predecessor`.
///
/// Returns `None` when the window cannot be filled or the configured
/// timespan overflows.
pub fn expected_target<L: AncestorLookup + ?Sized>(
    predecessor: Option<&HeaderRecord>,
    lookup: &L,
    config: &SpvConfig,
) -> Option<u32> {
    let window = config.retarget.window;
    if window < 2 {
        return None;
    }

    let mut current = predecessor?.clone();
    let mut target_sum = U512::zero();
    let mut elapsed: i64 = 0;

    for count in 1..=window {
        let target = U512::from(expand_compact(current.target())?);
        target_sum = target_sum + target;
        if count == 1 {
            target_sum = target_sum + target;
        }
        tracing::trace!(
            count,
            block_hash = ?current.block_hash(),
            target = current.target(),
            timestamp = current.timestamp(),
            "retarget sample"
        );

        if count == window {
            break;
        }
        let Some(parent) = lookup.header_by_hash(current.prev_block_hash()) else {
            tracing::trace!(count, "retarget window short of ancestors");
            return None;
        };
        let interval = i64::from(current.timestamp()) - i64::from(parent.timestamp());
        elapsed = elapsed.saturating_add(interval);
        current = parent;
    }

    let average = target_sum / U512::from(window as u64 + 1);
    let target_timespan = config.retarget.target_timespan_secs()?;
    if target_timespan == 0 {
        return None;
    }

    let min_timespan = i64::try_from(target_timespan / 3).ok()?;
    let max_timespan = i64::try_from(target_timespan.checked_mul(3)?).ok()?;
    let actual_timespan = elapsed.clamp(min_timespan, max_timespan).unsigned_abs();

    let max_target = U512::from(expand_compact(config.max_proof_of_work())?);
    let expected = (average * U512::from(actual_timespan) / U512::from(target_timespan))
        .min(max_target);

    U256::try_from(expected).ok().map(encode_compact)
}

/// Check a header's declared target against the retarget window.
///
/// # Errors
/// - `DifficultyMismatch` if the declared compact target is more than the
///   configured tolerance away from the expected one, or, when the window
///   cannot be filled, differs from the network maximum
pub fn check_difficulty<L: AncestorLookup + ?Sized>(
    header: &HeaderRecord,
    predecessor: Option<&HeaderRecord>,
    lookup: &L,
    config: &SpvConfig,
) -> Result<(), SpvError> {
    let declared = header.target();

    match expected_target(predecessor, lookup, config) {
        Some(expected) => {
            if invariant_within_tolerance(declared, expected, config.retarget.tolerance) {
                Ok(())
            } else {
                Err(SpvError::DifficultyMismatch { declared, expected })
            }
        }
        None => {
            let max = config.max_proof_of_work();
            if declared == max {
                Ok(())
            } else {
                Err(SpvError::DifficultyMismatch {
                    declared,
                    expected: max,
                })
            }
        }
    }
}

/// Boolean form of [`check_difficulty`].
pub fn verify_difficulty<L: AncestorLookup + ?Sized>(
    header: &HeaderRecord,
    predecessor: Option<&HeaderRecord>,
    lookup: &L,
    config: &SpvConfig,
) -> bool {
    check_difficulty(header, predecessor, lookup, config).is_ok()
}
