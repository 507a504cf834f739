//! # Validation Engine
//!
//! Consensus rules for a candidate header, applied in a fixed order. The
//! first failing rule is reported.
//!
//! | # | Rule | Error |
//! |---|------|-------|
//! | 0 | hash not yet stored | `DuplicateBlock` |
//! | 1 | parent stored | `UnknownAncestor` |
//! | 2 | bits match the required target | `DifficultyMismatch` |
//! | 3 | hash <= target | `InsufficientWork` |
//! | 4 | time > Median Time Past | `StaleTimestamp` |
//! | 5 | time <= now + bound (opt-in) | `FutureTimestamp` |

use super::chain_view::ChainView;
use super::difficulty::{bits_to_target, required_bits};
use super::header_codec::hash_to_u256;
use super::median_time::MedianTimeWindow;
use crate::domain::{
    short_hex, BlockHeader, BlockRecord, ChainParams, Hash, RelayError, RelayResult,
};
use crate::ports::TimeSource;

/// Stateful validator for one submission.
///
/// Holds the Median Time Past window of the last accepted header so that a
/// batch slides it in memory instead of re-reading ancestors.
pub struct HeaderValidator<'a> {
    params: &'a ChainParams,
    clock: Option<&'a dyn TimeSource>,
    window: Option<(Hash, MedianTimeWindow)>,
}

impl<'a> HeaderValidator<'a> {
    /// Validator without a host clock; the future bound is skipped.
    pub fn new(params: &'a ChainParams) -> Self {
        Self {
            params,
            clock: None,
            window: None,
        }
    }

    /// Attach the host clock used by the future timestamp bound.
    pub fn with_clock(mut self, clock: &'a dyn TimeSource) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate `header` against `view` and build its record.
    ///
    /// On success the candidate becomes the tip of the internal time window.
    pub fn validate<V: ChainView + ?Sized>(
        &mut self,
        view: &V,
        header: &BlockHeader,
        hash: Hash,
    ) -> RelayResult<BlockRecord> {
        // 0. Duplicate
        if view.block(&hash)?.is_some() {
            return Err(RelayError::DuplicateBlock(hash));
        }

        // 1. Ancestry
        let parent = view
            .block(&header.prev_hash)?
            .ok_or(RelayError::UnknownAncestor(header.prev_hash))?;
        let height = parent.height + 1;

        // 2. Difficulty
        let expected = required_bits(view, &parent, height, self.params)?;
        if bits_to_target(header.bits) != bits_to_target(expected) {
            return Err(RelayError::DifficultyMismatch {
                height,
                expected,
                actual: header.bits,
            });
        }

        // 3. Proof of work
        if hash_to_u256(&hash) > header.target() {
            return Err(RelayError::InsufficientWork(hash));
        }

        // 4. Median Time Past
        let mut window = self.window_for(view, &parent)?;
        let median = window.median().unwrap_or(parent.header.time);
        if header.time <= median {
            return Err(RelayError::StaleTimestamp {
                time: header.time,
                median,
            });
        }

        // 5. Future bound
        if let (Some(max_drift), Some(clock)) = (self.params.max_future_block_time, self.clock) {
            let now = clock.now();
            if u64::from(header.time) > now.saturating_add(u64::from(max_drift)) {
                return Err(RelayError::FutureTimestamp {
                    time: header.time,
                    now,
                    max_drift,
                });
            }
        }

        window.push(header.time);
        self.window = Some((hash, window));

        tracing::debug!("Header {} valid at height {}", short_hex(&hash), height);

        Ok(BlockRecord::child_of(&parent, hash, *header, self.params))
    }

    fn window_for<V: ChainView + ?Sized>(
        &self,
        view: &V,
        parent: &BlockRecord,
    ) -> RelayResult<MedianTimeWindow> {
        match &self.window {
            Some((tip, window)) if *tip == parent.hash => Ok(window.clone()),
            _ => MedianTimeWindow::seed(view, parent, self.params.median_time_span),
        }
    }
}
