//! # Domain Errors
//!
//! Rejection reasons surfaced by the validation core.
//!
//! Every variant is recoverable: the caller decides whether to drop the
//! block, penalize the peer, or retry with more chain context.

use thiserror::Error;

/// 32-byte double-SHA-256 digest in internal (little-endian) byte order.
pub type Hash = [u8; 32];

/// SPV validation error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpvError {
    /// Buffer too short, a declared length overruns the buffer, or the
    /// encoding is non-canonical.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Reconstructed partial merkle root does not commit to the header.
    #[error("Merkle root mismatch: declared {declared:?}, reconstructed {reconstructed:?}")]
    MerkleMismatch {
        /// Merkle root carried in the header
        declared: Hash,
        /// Root rebuilt from the proof (`None` if the proof was incomplete)
        reconstructed: Option<Hash>,
    },

    /// Header timestamp beyond reference time plus the allowed drift.
    #[error("Timestamp too far in future: {timestamp} > {limit}")]
    TimestampTooFarInFuture {
        /// Header timestamp
        timestamp: u32,
        /// Latest acceptable timestamp
        limit: u64,
    },

    /// Compact target is zero, negative, or easier than the network maximum.
    #[error("Target out of range: {target:#010x} (max {max:#010x})")]
    TargetOutOfRange {
        /// Declared compact target
        target: u32,
        /// Network maximum compact target
        max: u32,
    },

    /// Identity hash is above the expanded target.
    #[error("Proof of work insufficient for target {target:#010x}")]
    ProofOfWorkInsufficient {
        /// Declared compact target
        target: u32,
    },

    /// Declared target disagrees with the retarget rule.
    #[error("Difficulty mismatch: declared {declared:#010x}, expected {expected:#010x}")]
    DifficultyMismatch {
        /// Declared compact target
        declared: u32,
        /// Compact target required by the retarget window
        expected: u32,
    },

    /// Height is set-once.
    #[error("Height already set to {0}")]
    HeightAlreadySet(u32),

    /// Configuration rejected by [`crate::SpvConfig::validate`].
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_error() {
        let err = SpvError::MalformedMessage("buffer shorter than 80 bytes".to_string());
        assert!(err.to_string().contains("80 bytes"));
    }

    #[test]
    fn test_target_out_of_range_error() {
        let err = SpvError::TargetOutOfRange {
            target: 0x1e00ffff,
            max: 0x1d00ffff,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x1e00ffff"));
        assert!(msg.contains("0x1d00ffff"));
    }

    #[test]
    fn test_difficulty_mismatch_error() {
        let err = SpvError::DifficultyMismatch {
            declared: 0x1b0404cb,
            expected: 0x1b0404cd,
        };
        assert!(err.to_string().contains("0x1b0404cd"));
    }

    #[test]
    fn test_timestamp_error() {
        let err = SpvError::TimestampTooFarInFuture {
            timestamp: 10_000,
            limit: 9_000,
        };
        assert!(err.to_string().contains("10000 > 9000"));
    }

    #[test]
    fn test_height_already_set_error() {
        let err = SpvError::HeightAlreadySet(100_000);
        assert!(err.to_string().contains("100000"));
    }
}
