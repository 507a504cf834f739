//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits: storage and event transport.

mod events;
pub mod storage;

pub use events::{InMemoryEventPublisher, TracingEventPublisher};
pub use storage::{FileBackedKVStore, InMemoryKVStore};
