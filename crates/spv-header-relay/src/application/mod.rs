//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod chain_store;
pub mod service;

pub use chain_store::{ChainStore, StagedChain, StagedChanges};
pub use service::HeaderRelayService;
