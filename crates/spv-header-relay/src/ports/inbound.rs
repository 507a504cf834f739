//! # Inbound Ports
//!
//! API trait defining what the header relay can do.

use crate::domain::{
    BlockRecord, ChainTip, Direction, Hash, RelayResult, SubmitOutcome,
};
use primitive_types::U256;

/// Header relay API - inbound port.
///
/// Mutating calls are serialized by the implementation; queries always see
/// the last committed state.
pub trait HeaderRelayApi: Send + Sync {
    // === Bootstrap ===

    /// Seed the store with the network's genesis header (height 0, no prior
    /// work).
    fn bootstrap_genesis(&self, raw: &[u8]) -> RelayResult<SubmitOutcome>;

    /// Seed the store with a trusted checkpoint.
    ///
    /// `height` must be 0 or a retarget boundary; `cumulative_work` is the
    /// work of every block below `height`.
    fn bootstrap(
        &self,
        raw: &[u8],
        height: u64,
        cumulative_work: U256,
    ) -> RelayResult<SubmitOutcome>;

    // === Submission ===

    /// Validate and store a single raw header.
    fn submit_header(&self, raw: &[u8]) -> RelayResult<SubmitOutcome>;

    /// Validate and store a contiguous batch, all or nothing.
    fn submit_headers(&self, raws: &[Vec<u8>]) -> RelayResult<Vec<SubmitOutcome>>;

    // === Queries ===

    /// Is `hash` stored (canonical or not)?
    fn contains_block(&self, hash: &Hash) -> RelayResult<bool>;

    /// Height of a stored block.
    fn block_height(&self, hash: &Hash) -> RelayResult<Option<u64>>;

    /// Canonical hash at `height`.
    fn hash_at_height(&self, height: u64) -> RelayResult<Option<Hash>>;

    /// Merkle root of a stored block.
    fn merkle_root(&self, hash: &Hash) -> RelayResult<Option<Hash>>;

    /// Current mainchain head.
    fn mainchain_head(&self) -> RelayResult<Hash>;

    /// Height of the mainchain head.
    fn mainchain_height(&self) -> RelayResult<u64>;

    /// Does the canonical index point at `hash`?
    fn is_in_mainchain(&self, hash: &Hash) -> RelayResult<bool>;

    /// `mainchain_height - height(hash)`, defined only for canonical blocks.
    fn confirmations(&self, hash: &Hash) -> RelayResult<u64>;

    /// Full stored record.
    fn block_record(&self, hash: &Hash) -> RelayResult<Option<BlockRecord>>;

    /// Cumulative work at a stored block.
    fn chain_work(&self, hash: &Hash) -> RelayResult<U256>;

    /// Work of all completed epochs below the head's epoch.
    fn last_epoch_cumulative_work(&self) -> RelayResult<U256>;

    /// Compact target a child of `parent` must declare.
    fn next_required_bits(&self, parent: &Hash) -> RelayResult<u32>;

    /// Head summary.
    fn chain_tip(&self) -> RelayResult<ChainTip>;

    // === SPV ===

    /// Check that `tx_id` is included in canonical block `block_hash`, buried
    /// under at least `min_confirmations` blocks.
    fn verify_transaction(
        &self,
        tx_id: &Hash,
        block_hash: &Hash,
        proof: &[Hash],
        directions: &[Direction],
        min_confirmations: u64,
    ) -> RelayResult<bool>;
}
