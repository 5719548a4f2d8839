//! # SPV Validation Configuration
//!
//! Network selection, timestamp drift allowance and retarget window rules.

use crate::domain::{
    SpvError, MAINNET_MAX_PROOF_OF_WORK, MAX_TIME_DRIFT_SECS, REGTEST_MAX_PROOF_OF_WORK,
    RETARGET_SPACING_SECS, RETARGET_TOLERANCE, RETARGET_WINDOW,
};
use serde::{Deserialize, Serialize};

/// Network whose consensus constants apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
    /// Local regression-test network with trivial difficulty.
    Regtest,
}

impl Network {
    /// Easiest allowed compact target.
    pub fn max_proof_of_work(&self) -> u32 {
        match self {
            Self::Mainnet | Self::Testnet => MAINNET_MAX_PROOF_OF_WORK,
            Self::Regtest => REGTEST_MAX_PROOF_OF_WORK,
        }
    }
}

/// Difficulty retarget window rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetargetConfig {
    /// Number of ancestors sampled, starting at the predecessor.
    pub window: usize,

    /// Expected seconds between blocks.
    pub target_spacing_secs: u64,

    /// Allowed distance between declared and recomputed compact targets.
    pub tolerance: u32,
}

impl RetargetConfig {
    /// Expected duration of the window: `(window - 1) * spacing`.
    ///
    /// `None` if the window is empty or the product overflows.
    pub fn target_timespan_secs(&self) -> Option<u64> {
        let intervals = u64::try_from(self.window.checked_sub(1)?).ok()?;
        intervals.checked_mul(self.target_spacing_secs)
    }
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            window: RETARGET_WINDOW,
            target_spacing_secs: RETARGET_SPACING_SECS,
            tolerance: RETARGET_TOLERANCE,
        }
    }
}

/// SPV validation configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpvConfig {
    /// Network whose proof-of-work limit applies.
    pub network: Network,

    /// How far a header timestamp may run ahead of reference time.
    pub max_time_drift_secs: u64,

    /// Difficulty retarget rules.
    pub retarget: RetargetConfig,
}

impl Default for SpvConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            max_time_drift_secs: MAX_TIME_DRIFT_SECS,
            retarget: RetargetConfig::default(),
        }
    }
}

impl SpvConfig {
    /// Create a config for testing (regtest difficulty).
    pub fn for_testing() -> Self {
        Self {
            network: Network::Regtest,
            ..Self::default()
        }
    }

    /// Easiest allowed compact target for the configured network.
    pub fn max_proof_of_work(&self) -> u32 {
        self.network.max_proof_of_work()
    }

    /// Reject configurations the retarget rule cannot evaluate.
    ///
    /// # Errors
    /// - `InvalidConfig` if the window is shorter than two samples, the
    ///   block spacing is zero, or three window timespans overflow an `i64`
    pub fn validate(&self) -> Result<(), SpvError> {
        if self.retarget.window < 2 {
            return Err(SpvError::InvalidConfig(format!(
                "retarget window must be at least 2, got {}",
                self.retarget.window
            )));
        }
        if self.retarget.target_spacing_secs == 0 {
            return Err(SpvError::InvalidConfig(
                "retarget target spacing must be non-zero".to_string(),
            ));
        }
        // The clamp bound is three timespans and must fit a signed timestamp delta.
        let max_timespan = self
            .retarget
            .target_timespan_secs()
            .and_then(|timespan| timespan.checked_mul(3))
            .filter(|max| i64::try_from(*max).is_ok());
        if max_timespan.is_none() {
            return Err(SpvError::InvalidConfig(format!(
                "retarget timespan overflows: window {} x spacing {}s",
                self.retarget.window, self.retarget.target_spacing_secs
            )));
        }
        Ok(())
    }
}
