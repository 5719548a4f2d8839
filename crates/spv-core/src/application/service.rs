//! # Header Validation Service
//!
//! Application service combining the codec, merkle, proof-of-work and
//! retarget rules behind [`HeaderValidationApi`].

use rayon::prelude::*;

use crate::algorithms::{difficulty, merkle_verifier, proof_of_work, wire_codec};
use crate::config::SpvConfig;
use crate::domain::{HeaderRecord, MerkleBlock, SpvError, ValidatedBlock};
use crate::ports::{AncestorLookup, HeaderValidationApi, ReferenceClock, SystemClock};

/// Header Validation Service - turns peer bytes into trust decisions.
pub struct HeaderValidationService<L: AncestorLookup, C: ReferenceClock = SystemClock> {
    /// Configuration.
    config: SpvConfig,
    /// Read-only ancestor snapshot.
    ancestors: L,
    /// Reference time source.
    clock: C,
}

impl<L: AncestorLookup> HeaderValidationService<L, SystemClock> {
    /// Create a service using the wall clock.
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration is rejected by
    ///   [`SpvConfig::validate`]
    pub fn with_system_clock(config: SpvConfig, ancestors: L) -> Result<Self, SpvError> {
        Self::new(config, ancestors, SystemClock)
    }
}

impl<L: AncestorLookup, C: ReferenceClock> HeaderValidationService<L, C> {
    /// Create a new header validation service.
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration is rejected by
    ///   [`SpvConfig::validate`]
    pub fn new(config: SpvConfig, ancestors: L, clock: C) -> Result<Self, SpvError> {
        config.validate()?;
        Ok(Self {
            config,
            ancestors,
            clock,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &SpvConfig {
        &self.config
    }

    /// Ancestor snapshot used for retarget checks.
    pub fn ancestors(&self) -> &L {
        &self.ancestors
    }

    /// Internal: log a rejection and hand the error back.
    fn rejected(&self, header: &HeaderRecord, error: SpvError) -> SpvError {
        tracing::warn!(
            block_hash = ?header.block_hash(),
            target = header.target(),
            timestamp = header.timestamp(),
            error = %error,
            "header rejected"
        );
        error
    }

    /// Validate independent messages in parallel, preserving input order.
    ///
    /// Each message is checked as by [`HeaderValidationApi::validate_message`].
    pub fn validate_batch(&self, messages: &[&[u8]]) -> Vec<Result<ValidatedBlock, SpvError>>
    where
        L: Sync,
        C: Sync,
    {
        messages
            .par_iter()
            .map(|bytes| self.validate_message(bytes))
            .collect()
    }
}

impl<L: AncestorLookup, C: ReferenceClock> HeaderValidationApi for HeaderValidationService<L, C> {
    fn parse_message(&self, bytes: &[u8]) -> Option<MerkleBlock> {
        wire_codec::decode_merkle_block(bytes)
    }

    fn validate_message(&self, bytes: &[u8]) -> Result<ValidatedBlock, SpvError> {
        let Some(block) = self.parse_message(bytes) else {
            tracing::warn!(len = bytes.len(), "malformed merkle block message");
            return Err(SpvError::MalformedMessage(format!(
                "cannot decode {} byte message",
                bytes.len()
            )));
        };
        self.validate_block(&block)
    }

    fn validate_block(&self, block: &MerkleBlock) -> Result<ValidatedBlock, SpvError> {
        let header = &block.header;

        let matched_tx_hashes = merkle_verifier::check_merkle_commitment(block)
            .map_err(|e| self.rejected(header, e))?;
        proof_of_work::check_header(header, self.clock.now(), &self.config)
            .map_err(|e| self.rejected(header, e))?;

        tracing::debug!(
            block_hash = ?header.block_hash(),
            matched = matched_tx_hashes.len(),
            "header accepted"
        );

        Ok(ValidatedBlock {
            header: header.clone(),
            matched_tx_hashes,
        })
    }

    fn verify_difficulty(&self, header: &HeaderRecord) -> Result<(), SpvError> {
        let predecessor = self.ancestors.header_by_hash(header.prev_block_hash());
        difficulty::check_difficulty(header, predecessor.as_ref(), &self.ancestors, &self.config)
            .map_err(|e| self.rejected(header, e))
    }

    fn validate_in_chain(&self, bytes: &[u8]) -> Result<ValidatedBlock, SpvError> {
        let mut validated = self.validate_message(bytes)?;
        let header = &validated.header;

        let predecessor = self.ancestors.header_by_hash(header.prev_block_hash());
        difficulty::check_difficulty(header, predecessor.as_ref(), &self.ancestors, &self.config)
            .map_err(|e| self.rejected(header, e))?;

        if let Some(height) = predecessor
            .and_then(|p| p.height())
            .and_then(|h| h.checked_add(1))
        {
            validated.header.set_height(height)?;
        }

        tracing::debug!(
            block_hash = ?validated.header.block_hash(),
            height = ?validated.header.height(),
            "header connected"
        );
        Ok(validated)
    }
}
