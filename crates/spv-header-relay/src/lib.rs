//! # SPV Header Relay
//!
//! Header-chain validation and fork choice for a Bitcoin-style
//! proof-of-work network, plus Merkle inclusion proofs.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Accept raw 80-byte headers, enforce the consensus rules a full node
//! applies to them, track every competing branch, keep the canonical
//! (heaviest) chain indexed by height, and prove transaction inclusion
//! against stored Merkle roots.
//!
//! ## Consensus Rules
//!
//! | Rule | Description |
//! |------|-------------|
//! | Ancestry | Parent must be stored |
//! | Difficulty | Declared bits equal the retarget schedule |
//! | Proof of work | Hash at or below the target |
//! | Median Time Past | Time above the median of the previous 11 blocks |
//! | Future bound | Optional, two hours ahead of the host clock |
//!
//! ## Module Structure
//!
//! ```text
//! spv-header-relay/
//! ├── domain/          # Headers, records, chain state, errors, invariants
//! ├── algorithms/      # Codec, difficulty, validation, fork choice, Merkle
//! ├── ports/           # API trait (inbound) + storage/events/clock (outbound)
//! ├── adapters/        # In-memory and file stores, event publishers
//! ├── application/     # ChainStore and HeaderRelayService
//! └── config.rs        # RelayConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    FileBackedKVStore, InMemoryEventPublisher, InMemoryKVStore, TracingEventPublisher,
};
pub use algorithms::{
    bits_to_target, build_merkle_proof, compute_merkle_root, target_to_bits, verify, work,
};
pub use application::{ChainStore, HeaderRelayService};
pub use config::RelayConfig;
pub use domain::{
    BlockHeader, BlockRecord, ChainParams, ChainState, ChainTip, Direction, Hash, HeadUpdate,
    MerkleProof, RelayError, RelayEvent, RelayResult, StorageError, SubmitOutcome,
    DEFAULT_CONFIRMATIONS, MAX_FUTURE_BLOCK_TIME, RAW_HEADER_LEN,
};
pub use ports::{
    BatchOperation, EventPublisher, HeaderRelayApi, KeyValueStore, SystemTimeSource, TimeSource,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
