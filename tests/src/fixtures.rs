//! # Test Fixtures
//!
//! Header mining under easy targets and relay setup shared by the
//! integration scenarios.

use std::sync::Arc;

use primitive_types::U256;
use spv_header_relay::algorithms::header_codec::serialize;
use spv_header_relay::{
    BlockHeader, Hash, HeaderRelayApi, HeaderRelayService, InMemoryEventPublisher, InMemoryKVStore,
    KeyValueStore, RelayConfig, RelayResult, SubmitOutcome,
};
use tracing_subscriber::EnvFilter;

/// Relay over the given store with an inspectable publisher.
pub type TestRelay<S = InMemoryKVStore> = HeaderRelayService<S, InMemoryEventPublisher>;

/// Regtest minimum difficulty: roughly every other hash qualifies.
pub const EASY_BITS: u32 = 0x207fffff;

/// Timestamp of the fixture genesis block.
pub const GENESIS_TIME: u32 = 1_600_000_000;

/// Install a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory relay with regtest parameters.
pub fn relay() -> TestRelay {
    relay_with(RelayConfig::for_testing())
}

/// In-memory relay with a custom configuration.
pub fn relay_with(config: RelayConfig) -> TestRelay {
    relay_over(config, InMemoryKVStore::new())
}

/// Relay over an arbitrary store.
pub fn relay_over<S: KeyValueStore>(config: RelayConfig, kv: S) -> TestRelay<S> {
    init_tracing();
    HeaderRelayService::new(config, kv, Arc::new(InMemoryEventPublisher::new()))
        .expect("relay construction")
}

fn header(prev_hash: Hash, tag: u8, time: u32, bits: u32) -> BlockHeader {
    BlockHeader {
        version: 1,
        prev_hash,
        merkle_root: [tag; 32],
        time,
        bits,
        nonce: 0,
    }
}

fn meets_target(header: &BlockHeader) -> bool {
    U256::from_big_endian(&header.hash()) <= header.target()
}

/// Search nonces until the header satisfies its own target.
///
/// `tag` fills the Merkle root so sibling branches never collide.
pub fn mine(prev_hash: Hash, tag: u8, time: u32, bits: u32) -> BlockHeader {
    mine_with_root(prev_hash, [tag; 32], time, bits)
}

/// [`mine`] with an explicit Merkle root.
pub fn mine_with_root(prev_hash: Hash, merkle_root: Hash, time: u32, bits: u32) -> BlockHeader {
    let mut candidate = header(prev_hash, 0, time, bits);
    candidate.merkle_root = merkle_root;
    while !meets_target(&candidate) {
        candidate.nonce += 1;
    }
    candidate
}

/// Search nonces until the header FAILS its own target.
pub fn mine_invalid(prev_hash: Hash, tag: u8, time: u32, bits: u32) -> BlockHeader {
    let mut candidate = header(prev_hash, tag, time, bits);
    while meets_target(&candidate) {
        candidate.nonce += 1;
    }
    candidate
}

/// Wire form of a header.
pub fn raw(header: &BlockHeader) -> Vec<u8> {
    serialize(header).to_vec()
}

/// Fixture genesis: easy bits, all-zero parent.
pub fn genesis() -> BlockHeader {
    mine([0u8; 32], 0, GENESIS_TIME, EASY_BITS)
}

/// Bootstrap `relay` from the fixture genesis; returns its hash.
pub fn bootstrap<R: HeaderRelayApi + ?Sized>(relay: &R) -> Hash {
    relay
        .bootstrap_genesis(&raw(&genesis()))
        .expect("bootstrap")
        .hash
}

/// Submit a child of `parent` declaring the bits the relay requires.
pub fn extend<R: HeaderRelayApi + ?Sized>(
    relay: &R,
    parent: &Hash,
    tag: u8,
    time: u32,
) -> RelayResult<SubmitOutcome> {
    let bits = relay.next_required_bits(parent)?;
    relay.submit_header(&raw(&mine(*parent, tag, time, bits)))
}

/// Extend `parent` once per timestamp; returns the new hashes in order.
pub fn grow<R: HeaderRelayApi + ?Sized>(
    relay: &R,
    parent: &Hash,
    tag: u8,
    times: impl IntoIterator<Item = u32>,
) -> Vec<Hash> {
    let mut tip = *parent;
    let mut hashes = Vec::new();
    for time in times {
        tip = extend(relay, &tip, tag, time).expect("extend").hash;
        hashes.push(tip);
    }
    hashes
}

/// Headers chained on `parent`, all at `bits`, without submitting them.
pub fn mine_chain(parent: &Hash, tag: u8, times: &[u32], bits: u32) -> Vec<BlockHeader> {
    let mut tip = *parent;
    times
        .iter()
        .map(|time| {
            let h = mine(tip, tag, *time, bits);
            tip = h.hash();
            h
        })
        .collect()
}
