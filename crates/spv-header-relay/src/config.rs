//! # Relay Configuration
//!
//! Configuration for the header relay service.

use crate::domain::{ChainParams, RelayError, DEFAULT_CONFIRMATIONS, MAX_ADJUSTMENT_FACTOR};
use serde::{Deserialize, Serialize};

/// Header relay configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Consensus parameters of the relayed network.
    pub params: ChainParams,

    /// Maximum headers accepted in one batch submission.
    pub max_batch_size: usize,

    /// Decoded block records kept in the LRU cache.
    pub block_cache_size: usize,

    /// Confirmations required by [`verify_inclusion`].
    ///
    /// [`verify_inclusion`]: crate::HeaderRelayService::verify_inclusion
    pub required_confirmations: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            params: ChainParams::mainnet(),
            max_batch_size: 2016,
            block_cache_size: 4096,
            required_confirmations: DEFAULT_CONFIRMATIONS,
        }
    }
}

impl RelayConfig {
    /// Create a config for testing (regtest parameters, smaller values).
    pub fn for_testing() -> Self {
        Self {
            params: ChainParams::regtest(),
            max_batch_size: 64,
            block_cache_size: 64,
            required_confirmations: 1,
        }
    }

    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RelayError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RelayError::Format(format!("invalid relay config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, RelayError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RelayError::Format(format!("cannot encode relay config: {}", e)))
    }

    /// Reject parameter sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.params.retarget_interval == 0 {
            return Err(RelayError::Format("retarget_interval must be positive".into()));
        }
        if self.params.target_timespan < MAX_ADJUSTMENT_FACTOR {
            return Err(RelayError::Format(format!(
                "target_timespan must be at least {}",
                MAX_ADJUSTMENT_FACTOR
            )));
        }
        if self.params.pow_limit.is_zero() {
            return Err(RelayError::Format("pow_limit must be non-zero".into()));
        }
        if self.max_batch_size == 0 {
            return Err(RelayError::Format("max_batch_size must be positive".into()));
        }
        Ok(())
    }
}
