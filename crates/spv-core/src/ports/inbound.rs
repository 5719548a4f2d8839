//! # Inbound Ports
//!
//! API trait defining what the validation core offers its callers.

use crate::domain::{HeaderRecord, MerkleBlock, SpvError, ValidatedBlock};

/// Header validation API - inbound port.
///
/// Every operation is synchronous and bounded; failures name the check that
/// rejected the block and leave no partial state behind.
pub trait HeaderValidationApi {
    /// Parse a wire message without validating it.
    fn parse_message(&self, bytes: &[u8]) -> Option<MerkleBlock>;

    /// Parse and validate a wire message: merkle commitment, target range,
    /// timestamp drift and proof of work.
    fn validate_message(&self, bytes: &[u8]) -> Result<ValidatedBlock, SpvError>;

    /// Validate an already parsed merkle block.
    fn validate_block(&self, block: &MerkleBlock) -> Result<ValidatedBlock, SpvError>;

    /// Check the header's declared target against its retarget window.
    fn verify_difficulty(&self, header: &HeaderRecord) -> Result<(), SpvError>;

    /// Full validation plus the retarget rule. Assigns the height when the
    /// predecessor's height is known.
    fn validate_in_chain(&self, bytes: &[u8]) -> Result<ValidatedBlock, SpvError>;
}
