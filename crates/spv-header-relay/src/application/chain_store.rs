//! # Chain Store
//!
//! Durable block records, canonical height index and chain state over a
//! [`KeyValueStore`].
//!
//! ## Key layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `blk:` + hash | bincode `BlockRecord` |
//! | `hgt:` + height (u64 BE) | 32-byte hash |
//! | `meta:state` | bincode `ChainState` |
//!
//! Writes are staged in a [`StagedChain`] overlay and land in one atomic
//! batch on [`ChainStore::commit`]. Nothing reaches the store or the record
//! cache before that.

use crate::algorithms::chain_view::{CanonicalIndex, ChainView};
use crate::domain::{
    short_hex, BlockRecord, ChainState, Hash, RelayError, RelayEvent, RelayResult, StorageError,
};
use crate::ports::{BatchOperation, KeyValueStore};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;

const BLOCK_PREFIX: &[u8] = b"blk:";
const HEIGHT_PREFIX: &[u8] = b"hgt:";
const STATE_KEY: &[u8] = b"meta:state";

fn block_key(hash: &Hash) -> Vec<u8> {
    [BLOCK_PREFIX, hash.as_slice()].concat()
}

fn height_key(height: u64) -> Vec<u8> {
    [HEIGHT_PREFIX, height.to_be_bytes().as_slice()].concat()
}

/// Persistent chain storage with a decoded-record cache.
pub struct ChainStore<S: KeyValueStore> {
    kv: S,
    state: Option<ChainState>,
    cache: Mutex<LruCache<Hash, BlockRecord>>,
}

impl<S: KeyValueStore> ChainStore<S> {
    /// Open over `kv`, loading chain state if a previous run left one.
    pub fn open(kv: S, cache_size: usize) -> RelayResult<Self> {
        let state = match kv.get(STATE_KEY)? {
            Some(bytes) => Some(
                bincode::deserialize::<ChainState>(&bytes).map_err(StorageError::from)?,
            ),
            None => None,
        };

        if let Some(state) = &state {
            tracing::info!(
                "Chain store opened at height {} (head {})",
                state.mainchain_height,
                short_hex(&state.mainchain_head)
            );
        }

        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            kv,
            state,
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Committed chain state, if bootstrapped.
    pub fn state(&self) -> Option<&ChainState> {
        self.state.as_ref()
    }

    /// Committed chain state, or `NotBootstrapped`.
    pub fn require_state(&self) -> RelayResult<&ChainState> {
        self.state.as_ref().ok_or(RelayError::NotBootstrapped)
    }

    /// Has a bootstrap block been committed?
    pub fn is_bootstrapped(&self) -> bool {
        self.state.is_some()
    }

    /// Committed record for `hash`.
    pub fn get_block(&self, hash: &Hash) -> RelayResult<Option<BlockRecord>> {
        if let Some(record) = self.cache.lock().get(hash) {
            return Ok(Some(record.clone()));
        }

        let Some(bytes) = self.kv.get(&block_key(hash))? else {
            return Ok(None);
        };
        let record: BlockRecord = bincode::deserialize(&bytes).map_err(StorageError::from)?;
        if record.hash != *hash {
            return Err(StorageError::Corruption {
                message: format!(
                    "record under {} names {}",
                    short_hex(hash),
                    short_hex(&record.hash)
                ),
            }
            .into());
        }

        self.cache.lock().put(*hash, record.clone());
        Ok(Some(record))
    }

    /// Committed canonical hash at `height`.
    pub fn get_canonical(&self, height: u64) -> RelayResult<Option<Hash>> {
        let Some(bytes) = self.kv.get(&height_key(height))? else {
            return Ok(None);
        };
        let hash: Hash = bytes.as_slice().try_into().map_err(|_| StorageError::Corruption {
            message: format!("height {} entry has {} bytes", height, bytes.len()),
        })?;
        Ok(Some(hash))
    }

    /// Number of stored block records, canonical or not.
    pub fn block_count(&self) -> RelayResult<usize> {
        Ok(self.kv.prefix_scan(BLOCK_PREFIX)?.len())
    }

    /// Overlay for staging writes against the committed state.
    pub fn stage(&self) -> StagedChain<'_, S> {
        StagedChain {
            base: self,
            records: HashMap::new(),
            order: Vec::new(),
            heights: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Write every staged change in one atomic batch.
    ///
    /// Returns the staged events for publication. On error the store, the
    /// state and the cache are unchanged.
    pub fn commit(&mut self, changes: StagedChanges) -> RelayResult<Vec<RelayEvent>> {
        let mut ops = Vec::with_capacity(changes.records.len() + changes.heights.len() + 1);

        for record in &changes.records {
            ops.push(BatchOperation::put(
                block_key(&record.hash),
                bincode::serialize(record).map_err(StorageError::from)?,
            ));
        }
        for (height, entry) in &changes.heights {
            ops.push(match entry {
                Some(hash) => BatchOperation::put(height_key(*height), hash.to_vec()),
                None => BatchOperation::delete(height_key(*height)),
            });
        }
        ops.push(BatchOperation::put(
            STATE_KEY.to_vec(),
            bincode::serialize(&changes.state).map_err(StorageError::from)?,
        ));

        self.kv.atomic_batch_write(ops)?;

        let mut cache = self.cache.lock();
        for record in changes.records {
            cache.put(record.hash, record);
        }
        drop(cache);
        self.state = Some(changes.state);

        Ok(changes.events)
    }
}

impl<S: KeyValueStore> ChainView for ChainStore<S> {
    fn block(&self, hash: &Hash) -> RelayResult<Option<BlockRecord>> {
        self.get_block(hash)
    }

    fn canonical_hash(&self, height: u64) -> RelayResult<Option<Hash>> {
        self.get_canonical(height)
    }
}

/// Pending writes on top of a [`ChainStore`].
///
/// Reads see staged records and index entries first.
pub struct StagedChain<'a, S: KeyValueStore> {
    base: &'a ChainStore<S>,
    records: HashMap<Hash, BlockRecord>,
    order: Vec<Hash>,
    heights: BTreeMap<u64, Option<Hash>>,
    events: Vec<RelayEvent>,
}

impl<'a, S: KeyValueStore> StagedChain<'a, S> {
    /// Stage a newly validated record. Records are never overwritten.
    pub fn append(&mut self, record: BlockRecord) {
        self.events.push(RelayEvent::BlockAccepted {
            height: record.height,
            hash: record.hash,
        });
        self.order.push(record.hash);
        self.records.insert(record.hash, record);
    }

    /// Queue an event for publication after commit.
    pub fn push_event(&mut self, event: RelayEvent) {
        self.events.push(event);
    }

    /// Freeze the overlay together with the resulting chain state.
    pub fn into_changes(mut self, state: ChainState) -> StagedChanges {
        let records = self
            .order
            .iter()
            .filter_map(|hash| self.records.remove(hash))
            .collect();

        StagedChanges {
            records,
            heights: self.heights,
            state,
            events: self.events,
        }
    }
}

impl<'a, S: KeyValueStore> ChainView for StagedChain<'a, S> {
    fn block(&self, hash: &Hash) -> RelayResult<Option<BlockRecord>> {
        match self.records.get(hash) {
            Some(record) => Ok(Some(record.clone())),
            None => self.base.get_block(hash),
        }
    }

    fn canonical_hash(&self, height: u64) -> RelayResult<Option<Hash>> {
        match self.heights.get(&height) {
            Some(entry) => Ok(*entry),
            None => self.base.get_canonical(height),
        }
    }
}

impl<'a, S: KeyValueStore> CanonicalIndex for StagedChain<'a, S> {
    fn set_canonical(&mut self, height: u64, hash: Hash) {
        self.heights.insert(height, Some(hash));
    }

    fn clear_canonical(&mut self, height: u64) {
        self.heights.insert(height, None);
    }
}

/// Frozen output of a [`StagedChain`], ready to commit.
#[derive(Debug, Clone)]
pub struct StagedChanges {
    /// New records in append order.
    pub records: Vec<BlockRecord>,
    /// Index writes; `None` deletes the entry.
    pub heights: BTreeMap<u64, Option<Hash>>,
    /// Chain state after the staged operations.
    pub state: ChainState,
    /// Events to publish once committed.
    pub events: Vec<RelayEvent>,
}
