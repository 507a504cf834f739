//! # Domain Entities
//!
//! Header records, stored block records and the canonical chain state.

use super::errors::Hash;
use super::value_objects::ChainParams;
use crate::algorithms::{difficulty, header_codec};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Parsed 80-byte block header.
///
/// Identifier fields are held in big-endian identifier order (reversed from
/// the wire).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version.
    pub version: i32,
    /// Identifier of the parent block.
    pub prev_hash: Hash,
    /// Merkle root of the block's transactions.
    pub merkle_root: Hash,
    /// Unix timestamp in seconds.
    pub time: u32,
    /// Compact difficulty target.
    pub bits: u32,
    /// Nonce.
    pub nonce: u32,
}

impl BlockHeader {
    /// Block identifier (double SHA-256 of the serialized header, reversed).
    pub fn hash(&self) -> Hash {
        header_codec::block_hash(&header_codec::serialize(self))
    }

    /// Full-width target implied by `bits`.
    pub fn target(&self) -> U256 {
        difficulty::bits_to_target(self.bits)
    }

    /// Work contributed by a single block at this target.
    pub fn work(&self) -> U256 {
        difficulty::work(self.target())
    }
}

/// A validated header as stored in the chain store.
///
/// Created once per hash and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockRecord {
    /// Block identifier.
    pub hash: Hash,
    /// The header itself.
    pub header: BlockHeader,
    /// Height above genesis.
    pub height: u64,
    /// Work of all completed epochs below this block's epoch, along this
    /// block's own ancestry.
    pub epoch_work_base: U256,
}

impl BlockRecord {
    /// Record for a freshly validated child of `parent`.
    pub fn child_of(
        parent: &BlockRecord,
        hash: Hash,
        header: BlockHeader,
        params: &ChainParams,
    ) -> Self {
        let height = parent.height + 1;
        let epoch_work_base = if params.is_retarget_height(height) {
            parent.cumulative_work(params)
        } else {
            parent.epoch_work_base
        };

        Self {
            hash,
            header,
            height,
            epoch_work_base,
        }
    }

    /// Height of the first block of this record's epoch.
    pub fn epoch_start(&self, params: &ChainParams) -> u64 {
        self.height - self.height % params.retarget_interval
    }

    /// Cumulative chain work up to and including this block.
    pub fn cumulative_work(&self, params: &ChainParams) -> U256 {
        let blocks_in_epoch = self.height - self.epoch_start(params) + 1;
        self.epoch_work_base.saturating_add(difficulty::epoch_cumulative_work(
            self.header.target(),
            blocks_in_epoch,
        ))
    }
}

/// Canonical chain metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainState {
    /// Tip of the heaviest stored chain.
    pub mainchain_head: Hash,
    /// Height of `mainchain_head`.
    pub mainchain_height: u64,
    /// Work of all completed epochs below the head's epoch.
    pub last_epoch_cumulative_work: U256,
    /// Hash of the trusted bootstrap block.
    pub bootstrap_hash: Hash,
    /// Height of the trusted bootstrap block.
    pub bootstrap_height: u64,
}

impl ChainState {
    /// State right after bootstrapping from `record`.
    pub fn bootstrapped(record: &BlockRecord) -> Self {
        Self {
            mainchain_head: record.hash,
            mainchain_height: record.height,
            last_epoch_cumulative_work: record.epoch_work_base,
            bootstrap_hash: record.hash,
            bootstrap_height: record.height,
        }
    }

    /// Move the head to `record`.
    pub fn set_head(&mut self, record: &BlockRecord) {
        self.mainchain_head = record.hash;
        self.mainchain_height = record.height;
        self.last_epoch_cumulative_work = record.epoch_work_base;
    }
}
