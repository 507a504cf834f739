//! Event publisher adapters
//!
//! Implements the `EventPublisher` port for relay notifications.

use crate::domain::{short_hex, RelayEvent};
use crate::ports::EventPublisher;
use parking_lot::RwLock;

/// In-memory event publisher for testing and host inspection.
pub struct InMemoryEventPublisher {
    events: RwLock<Vec<RelayEvent>>,
}

impl InMemoryEventPublisher {
    /// Publisher with no recorded events.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Every event published so far, in order.
    pub fn get_events(&self) -> Vec<RelayEvent> {
        self.events.read().clone()
    }

    /// Number of recorded events.
    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    /// Remove and return the recorded events.
    pub fn drain(&self) -> Vec<RelayEvent> {
        std::mem::take(&mut *self.events.write())
    }
}

impl Default for InMemoryEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, event: RelayEvent) {
        self.events.write().push(event);
    }
}

/// Publisher that only logs events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: RelayEvent) {
        match event {
            RelayEvent::BlockAccepted { height, hash } => {
                tracing::debug!("BlockAccepted height={} hash={}", height, short_hex(&hash));
            }
            RelayEvent::HeadChanged { height, hash } => {
                tracing::info!("HeadChanged height={} hash={}", height, short_hex(&hash));
            }
        }
    }
}
