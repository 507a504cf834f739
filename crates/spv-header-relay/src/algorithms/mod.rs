//! # Algorithms Module
//!
//! Consensus algorithms: header codec, difficulty, validation, fork choice
//! and Merkle inclusion proofs.

pub mod chain_view;
pub mod difficulty;
pub mod fork_choice;
pub mod header_codec;
pub mod median_time;
pub mod merkle_verifier;
pub mod validation;

pub use chain_view::{ancestor_at, parent_of, CanonicalIndex, ChainView};
pub use difficulty::{
    bits_to_target, epoch_cumulative_work, required_bits, required_target, retarget,
    target_to_bits, work,
};
pub use fork_choice::update_head;
pub use header_codec::{block_hash, parse, serialize, sha256d, RawHeader};
pub use median_time::MedianTimeWindow;
pub use merkle_verifier::{build_merkle_proof, compute_merkle_root, verify, verify_proof};
pub use validation::HeaderValidator;
