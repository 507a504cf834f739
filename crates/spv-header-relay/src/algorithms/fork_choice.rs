//! # Heaviest-Chain Fork Choice
//!
//! Keeps the canonical height index pointing at the stored chain with the
//! most cumulative work.
//!
//! ## Rules
//!
//! 1. A child of the current head extends the chain
//! 2. Any other record wins only with STRICTLY more work (ties keep the
//!    incumbent)
//! 3. A winning fork rewrites the index backward until it meets a height
//!    already pointing at its own ancestor, then drops entries above its tip
//!
//! The rewrite walk is bounded by the distance to the bootstrap block.

use super::chain_view::{parent_of, CanonicalIndex, ChainView};
use crate::domain::{
    short_hex, BlockRecord, ChainParams, ChainState, HeadUpdate, RelayResult, StorageError,
};

/// Apply fork choice for a freshly stored `record`.
pub fn update_head<I: CanonicalIndex + ?Sized>(
    index: &mut I,
    state: &mut ChainState,
    record: &BlockRecord,
    params: &ChainParams,
) -> RelayResult<HeadUpdate> {
    if record.header.prev_hash == state.mainchain_head {
        index.set_canonical(record.height, record.hash);
        state.set_head(record);
        tracing::info!(
            "Head extended to {} at height {}",
            short_hex(&record.hash),
            record.height
        );
        return Ok(HeadUpdate::Extended);
    }

    let head = index
        .block(&state.mainchain_head)?
        .ok_or_else(|| StorageError::Corruption {
            message: format!("head {} has no record", short_hex(&state.mainchain_head)),
        })?;

    let candidate_work = record.cumulative_work(params);
    let head_work = head.cumulative_work(params);
    if candidate_work <= head_work {
        tracing::debug!(
            "Fork block {} at height {} stored without head change",
            short_hex(&record.hash),
            record.height
        );
        return Ok(HeadUpdate::Unchanged);
    }

    let common_ancestor_height = reindex_branch(index, state, record)?;

    for height in (record.height + 1)..=head.height {
        index.clear_canonical(height);
    }

    let depth = head.height - common_ancestor_height;
    state.set_head(record);

    tracing::info!(
        "Reorg to {} at height {}: common ancestor {}, {} block(s) abandoned",
        short_hex(&record.hash),
        record.height,
        common_ancestor_height,
        depth
    );

    Ok(HeadUpdate::Reorganized {
        common_ancestor_height,
        depth,
    })
}

/// Point the index at `tip`'s branch; returns the common ancestor's height.
fn reindex_branch<I: CanonicalIndex + ?Sized>(
    index: &mut I,
    state: &ChainState,
    tip: &BlockRecord,
) -> RelayResult<u64> {
    let corrupt = || StorageError::CorruptAncestry { from: tip.hash };
    let max_steps = tip
        .height
        .checked_sub(state.bootstrap_height)
        .ok_or_else(corrupt)?
        + 1;

    let mut cursor = tip.clone();
    let mut steps = 0u64;
    loop {
        if index.canonical_hash(cursor.height)? == Some(cursor.hash) {
            return Ok(cursor.height);
        }
        // The bootstrap block is always canonical
        if steps >= max_steps || cursor.height <= state.bootstrap_height {
            return Err(corrupt().into());
        }

        index.set_canonical(cursor.height, cursor.hash);
        steps += 1;
        cursor = parent_of(&*index, &cursor)?;
    }
}
