//! # Domain Value Objects
//!
//! Immutable value types: consensus parameters, proof shapes, event payloads
//! and submission outcomes.

use super::errors::Hash;
use super::invariants::{
    MAINNET_RETARGET_INTERVAL, MAINNET_TARGET_TIMESPAN, MAX_FUTURE_BLOCK_TIME, MEDIAN_TIME_SPAN,
};
use crate::algorithms::difficulty::bits_to_target;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Consensus parameters of the relayed network.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainParams {
    /// Blocks per retargeting epoch.
    pub retarget_interval: u64,
    /// Expected duration of one epoch in seconds.
    pub target_timespan: u32,
    /// Easiest allowed target.
    pub pow_limit: U256,
    /// Number of preceding timestamps used for Median Time Past.
    pub median_time_span: usize,
    /// Maximum seconds a header may run ahead of the host clock.
    /// `None` disables the check.
    pub max_future_block_time: Option<u32>,
}

impl ChainParams {
    /// Bitcoin mainnet parameters.
    pub fn mainnet() -> Self {
        Self {
            retarget_interval: MAINNET_RETARGET_INTERVAL,
            target_timespan: MAINNET_TARGET_TIMESPAN,
            pow_limit: bits_to_target(0x1d00ffff),
            median_time_span: MEDIAN_TIME_SPAN,
            max_future_block_time: None,
        }
    }

    /// Easy parameters for local chains: near-trivial target, short epochs.
    pub fn regtest() -> Self {
        Self {
            retarget_interval: 8,
            target_timespan: 8 * 600,
            pow_limit: bits_to_target(0x207fffff),
            median_time_span: MEDIAN_TIME_SPAN,
            max_future_block_time: None,
        }
    }

    /// Enable the two-hour future timestamp bound.
    pub fn with_future_bound(mut self) -> Self {
        self.max_future_block_time = Some(MAX_FUTURE_BLOCK_TIME);
        self
    }

    /// Does a block at `height` start a new epoch?
    pub fn is_retarget_height(&self, height: u64) -> bool {
        height % self.retarget_interval == 0
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Fold direction for one step of a Merkle proof.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    /// Sibling is on the left: `hash(sibling || running)`.
    Left,
    /// Sibling is on the right: `hash(running || sibling)`.
    Right,
    /// Odd node paired with itself: `hash(running || running)`.
    #[serde(rename = "self")]
    SelfPair,
}

/// Merkle inclusion proof for one transaction.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerkleProof {
    /// Sibling values in wire byte order, leaf to root.
    pub path: Vec<Hash>,
    /// Fold direction per step.
    pub directions: Vec<Direction>,
}

/// Canonical tip summary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainTip {
    /// Tip block hash.
    pub hash: Hash,
    /// Tip block height.
    pub height: u64,
    /// Cumulative work at the tip.
    pub chain_work: U256,
}

/// Notifications raised to the host.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RelayEvent {
    /// A header was validated and stored.
    BlockAccepted {
        /// Stored height
        height: u64,
        /// Stored hash
        hash: Hash,
    },
    /// The mainchain head changed value.
    HeadChanged {
        /// New head height
        height: u64,
        /// New head hash
        hash: Hash,
    },
}

/// What fork choice did with an accepted record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum HeadUpdate {
    /// Record extended the current head.
    Extended,
    /// A heavier branch took over.
    Reorganized {
        /// Height of the last block shared with the abandoned chain
        common_ancestor_height: u64,
        /// Number of abandoned canonical blocks
        depth: u64,
    },
    /// Record stored as a non-canonical fork.
    Unchanged,
}

impl HeadUpdate {
    /// Did the head change value?
    pub fn head_changed(&self) -> bool {
        !matches!(self, HeadUpdate::Unchanged)
    }
}

/// Result of accepting one header.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Hash of the accepted header.
    pub hash: Hash,
    /// Height it was stored at.
    pub height: u64,
    /// Fork choice decision.
    pub head_update: HeadUpdate,
}
