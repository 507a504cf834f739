//! # SPV Header Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Header mining, relay construction, tracing setup
//! └── integration/      # End-to-end scenarios through HeaderRelayApi
//!     ├── genesis.rs        # Real mainnet headers
//!     ├── reorg.rs          # Competing branches and index rewrites
//!     ├── batches.rs        # All-or-nothing submission
//!     ├── median_time.rs    # Median Time Past boundary
//!     ├── cross_epoch.rs    # Accumulator across retarget boundaries
//!     ├── persistence.rs    # Restart from a file-backed store
//!     ├── concurrency.rs    # Readers during writes
//!     └── callbacks.rs      # Publishers that query the relay
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p spv-relay-tests
//! cargo test -p spv-relay-tests integration::reorg
//! RUST_LOG=spv_header_relay=debug cargo test -p spv-relay-tests
//!
//! # Benchmarks
//! cargo bench -p spv-relay-tests
//! ```

pub mod fixtures;
