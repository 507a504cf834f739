//! # Median Time Past
//!
//! Sliding window of the timestamps preceding a candidate header.

use super::chain_view::ChainView;
use crate::domain::{BlockRecord, RelayResult};
use std::collections::VecDeque;

/// Timestamps of up to `span` consecutive blocks, oldest first.
#[derive(Clone, Debug)]
pub struct MedianTimeWindow {
    span: usize,
    times: VecDeque<u32>,
}

impl MedianTimeWindow {
    /// Empty window.
    pub fn new(span: usize) -> Self {
        Self {
            span: span.max(1),
            times: VecDeque::with_capacity(span.max(1)),
        }
    }

    /// Window ending at `tip`, walking stored ancestors.
    ///
    /// Stops early at the bootstrap block, whose parent is not stored.
    pub fn seed<V: ChainView + ?Sized>(
        view: &V,
        tip: &BlockRecord,
        span: usize,
    ) -> RelayResult<Self> {
        let mut window = Self::new(span);
        window.times.push_front(tip.header.time);

        let mut prev_hash = tip.header.prev_hash;
        while window.times.len() < window.span {
            match view.block(&prev_hash)? {
                Some(parent) => {
                    window.times.push_front(parent.header.time);
                    prev_hash = parent.header.prev_hash;
                }
                None => break,
            }
        }

        Ok(window)
    }

    /// Slide the window forward by one block.
    pub fn push(&mut self, time: u32) {
        self.times.push_back(time);
        while self.times.len() > self.span {
            self.times.pop_front();
        }
    }

    /// Median timestamp: the upper middle element for even lengths.
    pub fn median(&self) -> Option<u32> {
        if self.times.is_empty() {
            return None;
        }
        let mut sorted: Vec<u32> = self.times.iter().copied().collect();
        sorted.sort_unstable();
        Some(sorted[sorted.len() / 2])
    }

    /// Timestamps currently held.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Is the window empty?
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
