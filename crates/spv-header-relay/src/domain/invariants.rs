//! # Domain Invariants
//!
//! Consensus constants and the structural rules checked before any header
//! reaches the validation engine.

use super::errors::{Hash, RelayError};

/// Serialized header length.
pub const RAW_HEADER_LEN: usize = 80;

/// Mainnet blocks per retargeting epoch.
pub const MAINNET_RETARGET_INTERVAL: u64 = 2016;

/// Mainnet expected epoch duration (two weeks).
pub const MAINNET_TARGET_TIMESPAN: u32 = 1_209_600;

/// Maximum retarget adjustment factor in either direction.
pub const MAX_ADJUSTMENT_FACTOR: u32 = 4;

/// Number of preceding timestamps feeding Median Time Past.
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Future timestamp bound when enabled (two hours).
pub const MAX_FUTURE_BLOCK_TIME: u32 = 2 * 60 * 60;

/// Default confirmation depth for transaction verification.
pub const DEFAULT_CONFIRMATIONS: u64 = 6;

/// Invariant: bootstrap blocks sit on genesis or on an epoch boundary.
///
/// In-epoch work is derived from the epoch's first block, so a bootstrap
/// block in the middle of an epoch would leave its predecessors unaccounted.
pub fn invariant_bootstrap_height(height: u64, retarget_interval: u64) -> Result<(), RelayError> {
    if height != 0 && height % retarget_interval != 0 {
        return Err(RelayError::InvalidBootstrapHeight {
            height,
            interval: retarget_interval,
        });
    }
    Ok(())
}

/// Invariant: every batch element extends the element before it.
pub fn invariant_batch_contiguous(links: &[(Hash, Hash)]) -> Result<(), RelayError> {
    for (index, window) in links.windows(2).enumerate() {
        let (prev_hash, _) = window[0];
        let (_, parent) = window[1];
        if parent != prev_hash {
            return Err(RelayError::NonContiguousBatch {
                index: index + 1,
                expected_prev: prev_hash,
                actual_prev: parent,
            });
        }
    }
    Ok(())
}

/// Invariant: proof siblings and fold directions pair up one to one.
pub fn invariant_proof_shape(path_len: usize, directions_len: usize) -> Result<(), RelayError> {
    if path_len != directions_len {
        return Err(RelayError::Format(format!(
            "proof has {} elements but {} directions",
            path_len, directions_len
        )));
    }
    Ok(())
}
