//! # Header Relay Service
//!
//! Application service orchestrating validation, fork choice and storage.
//!
//! Every mutation holds the store's write lock across validate, stage,
//! fork choice and commit. Readers see only committed state.
//!
//! Events are published after the write lock is released, so a publisher
//! may query or submit to the relay. Mutations first take the writer lock
//! and keep it until their events are out, which keeps events in commit
//! order. Lock order is writer lock, then store; queries take the store only.

use parking_lot::{ReentrantMutex, RwLock, RwLockWriteGuard};
use primitive_types::U256;
use std::sync::Arc;

use super::chain_store::ChainStore;
use crate::algorithms::chain_view::{CanonicalIndex, ChainView};
use crate::algorithms::{difficulty, fork_choice, header_codec, merkle_verifier, HeaderValidator};
use crate::config::RelayConfig;
use crate::domain::{
    invariant_batch_contiguous, invariant_bootstrap_height, short_hex, BlockHeader, BlockRecord,
    ChainState, ChainTip, Direction, Hash, HeadUpdate, MerkleProof, RelayError, RelayEvent,
    RelayResult, SubmitOutcome,
};
use crate::ports::{EventPublisher, HeaderRelayApi, KeyValueStore, SystemTimeSource, TimeSource};

/// Header Relay Service - single-writer SPV chain engine.
pub struct HeaderRelayService<S: KeyValueStore, P: EventPublisher> {
    /// Configuration.
    config: RelayConfig,
    /// Chain storage.
    store: RwLock<ChainStore<S>>,
    /// Event transport.
    publisher: Arc<P>,
    /// Host clock for the optional future bound.
    clock: Box<dyn TimeSource>,
    /// Held by a mutation from before the store lock until its events are
    /// published. Reentrant for submissions made from inside `publish`.
    write_order: ReentrantMutex<()>,
}

impl<S: KeyValueStore, P: EventPublisher> HeaderRelayService<S, P> {
    /// Create a new relay service over `kv`.
    ///
    /// A store left by a previous run resumes where it stopped.
    pub fn new(config: RelayConfig, kv: S, publisher: Arc<P>) -> RelayResult<Self> {
        config.validate()?;
        let store = ChainStore::open(kv, config.block_cache_size)?;
        Ok(Self {
            config,
            store: RwLock::new(store),
            publisher,
            clock: Box::new(SystemTimeSource),
            write_order: ReentrantMutex::new(()),
        })
    }

    /// Replace the host clock.
    pub fn with_clock(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Event publisher.
    pub fn publisher(&self) -> &Arc<P> {
        &self.publisher
    }

    /// Number of stored block records, canonical or not.
    pub fn block_count(&self) -> RelayResult<usize> {
        self.store.read().block_count()
    }

    /// [`HeaderRelayApi::verify_transaction`] with a [`MerkleProof`] and the
    /// configured confirmation depth.
    pub fn verify_inclusion(
        &self,
        tx_id: &Hash,
        block_hash: &Hash,
        proof: &MerkleProof,
    ) -> RelayResult<bool> {
        self.verify_transaction(
            tx_id,
            block_hash,
            &proof.path,
            &proof.directions,
            self.config.required_confirmations,
        )
    }

    /// Validate, stage and commit `headers` in order; all or nothing.
    ///
    /// Errors carry the index of the failing header.
    fn apply(
        &self,
        headers: &[(BlockHeader, Hash)],
    ) -> Result<Vec<SubmitOutcome>, (usize, RelayError)> {
        let _order = self.write_order.lock();
        let mut store = self.store.write();
        let mut state = store.require_state().map_err(|e| (0, e))?.clone();

        let (outcomes, changes) = {
            let mut staged = store.stage();
            let mut validator =
                HeaderValidator::new(&self.config.params).with_clock(&*self.clock);
            let mut outcomes = Vec::with_capacity(headers.len());

            for (index, (header, hash)) in headers.iter().enumerate() {
                let record = validator
                    .validate(&staged, header, *hash)
                    .map_err(|e| (index, e))?;
                staged.append(record.clone());

                let head_update =
                    fork_choice::update_head(&mut staged, &mut state, &record, &self.config.params)
                        .map_err(|e| (index, e))?;
                if head_update.head_changed() {
                    staged.push_event(RelayEvent::HeadChanged {
                        height: state.mainchain_height,
                        hash: state.mainchain_head,
                    });
                }

                outcomes.push(SubmitOutcome {
                    hash: record.hash,
                    height: record.height,
                    head_update,
                });
            }

            (outcomes, staged.into_changes(state))
        };

        let last = headers.len().saturating_sub(1);
        let events = store.commit(changes).map_err(|e| (last, e))?;
        self.release_and_publish(store, events);

        Ok(outcomes)
    }

    /// Caller holds `write_order`.
    fn release_and_publish(
        &self,
        store: RwLockWriteGuard<'_, ChainStore<S>>,
        events: Vec<RelayEvent>,
    ) {
        drop(store);
        for event in events {
            self.publisher.publish(event);
        }
    }

    fn with_record<T>(
        &self,
        hash: &Hash,
        f: impl FnOnce(&ChainStore<S>, &BlockRecord) -> RelayResult<T>,
    ) -> RelayResult<T> {
        let store = self.store.read();
        let record = store.get_block(hash)?.ok_or(RelayError::UnknownBlock(*hash))?;
        f(&store, &record)
    }

    fn canonical_depth(store: &ChainStore<S>, record: &BlockRecord) -> RelayResult<u64> {
        let state = store.require_state()?;
        if !store.is_canonical(record)? {
            return Err(RelayError::NotInMainchain(record.hash));
        }
        Ok(state.mainchain_height - record.height)
    }
}

impl<S: KeyValueStore, P: EventPublisher> HeaderRelayApi for HeaderRelayService<S, P> {
    fn bootstrap_genesis(&self, raw: &[u8]) -> RelayResult<SubmitOutcome> {
        self.bootstrap(raw, 0, U256::zero())
    }

    fn bootstrap(
        &self,
        raw: &[u8],
        height: u64,
        cumulative_work: U256,
    ) -> RelayResult<SubmitOutcome> {
        let (header, hash) = header_codec::parse(raw)?;
        invariant_bootstrap_height(height, self.config.params.retarget_interval)?;

        let _order = self.write_order.lock();
        let mut store = self.store.write();
        if store.is_bootstrapped() {
            return Err(RelayError::AlreadyBootstrapped);
        }

        // Trusted input: the record starts an epoch, so everything below it
        // is completed-epoch work
        let record = BlockRecord {
            hash,
            header,
            height,
            epoch_work_base: cumulative_work,
        };

        let changes = {
            let mut staged = store.stage();
            staged.append(record.clone());
            staged.set_canonical(height, hash);
            staged.push_event(RelayEvent::HeadChanged { height, hash });
            staged.into_changes(ChainState::bootstrapped(&record))
        };
        let events = store.commit(changes)?;
        self.release_and_publish(store, events);

        tracing::info!("Bootstrapped at height {} with {}", height, short_hex(&hash));

        Ok(SubmitOutcome {
            hash,
            height,
            head_update: HeadUpdate::Extended,
        })
    }

    fn submit_header(&self, raw: &[u8]) -> RelayResult<SubmitOutcome> {
        let parsed = header_codec::parse(raw)?;
        match self.apply(std::slice::from_ref(&parsed)) {
            Ok(mut outcomes) => outcomes.pop().ok_or_else(|| {
                RelayError::Format("submission produced no outcome".into())
            }),
            Err((_, e)) => {
                tracing::warn!("Rejected header {}: {}", short_hex(&parsed.1), e);
                Err(e)
            }
        }
    }

    fn submit_headers(&self, raws: &[Vec<u8>]) -> RelayResult<Vec<SubmitOutcome>> {
        if raws.is_empty() {
            return Err(RelayError::Format("empty batch".into()));
        }
        if raws.len() > self.config.max_batch_size {
            return Err(RelayError::Format(format!(
                "batch of {} exceeds limit {}",
                raws.len(),
                self.config.max_batch_size
            )));
        }

        let parsed = raws
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                header_codec::parse(raw).map_err(|e| RelayError::Batch {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<RelayResult<Vec<_>>>()?;

        let links: Vec<(Hash, Hash)> =
            parsed.iter().map(|(h, hash)| (*hash, h.prev_hash)).collect();
        invariant_batch_contiguous(&links)?;

        match self.apply(&parsed) {
            Ok(outcomes) => {
                tracing::debug!("Batch of {} headers committed", outcomes.len());
                Ok(outcomes)
            }
            Err((index, e)) => {
                tracing::warn!(
                    "Rejected batch of {} headers at index {}: {}",
                    parsed.len(),
                    index,
                    e
                );
                Err(RelayError::Batch {
                    index,
                    source: Box::new(e),
                })
            }
        }
    }

    fn contains_block(&self, hash: &Hash) -> RelayResult<bool> {
        Ok(self.store.read().get_block(hash)?.is_some())
    }

    fn block_height(&self, hash: &Hash) -> RelayResult<Option<u64>> {
        Ok(self.store.read().get_block(hash)?.map(|r| r.height))
    }

    fn hash_at_height(&self, height: u64) -> RelayResult<Option<Hash>> {
        self.store.read().get_canonical(height)
    }

    fn merkle_root(&self, hash: &Hash) -> RelayResult<Option<Hash>> {
        Ok(self.store.read().get_block(hash)?.map(|r| r.header.merkle_root))
    }

    fn mainchain_head(&self) -> RelayResult<Hash> {
        Ok(self.store.read().require_state()?.mainchain_head)
    }

    fn mainchain_height(&self) -> RelayResult<u64> {
        Ok(self.store.read().require_state()?.mainchain_height)
    }

    fn is_in_mainchain(&self, hash: &Hash) -> RelayResult<bool> {
        let store = self.store.read();
        match store.get_block(hash)? {
            Some(record) => store.is_canonical(&record),
            None => Ok(false),
        }
    }

    fn confirmations(&self, hash: &Hash) -> RelayResult<u64> {
        self.with_record(hash, Self::canonical_depth)
    }

    fn block_record(&self, hash: &Hash) -> RelayResult<Option<BlockRecord>> {
        self.store.read().get_block(hash)
    }

    fn chain_work(&self, hash: &Hash) -> RelayResult<U256> {
        self.with_record(hash, |_, record| Ok(record.cumulative_work(&self.config.params)))
    }

    fn last_epoch_cumulative_work(&self) -> RelayResult<U256> {
        Ok(self.store.read().require_state()?.last_epoch_cumulative_work)
    }

    fn next_required_bits(&self, parent: &Hash) -> RelayResult<u32> {
        self.with_record(parent, |store, record| {
            difficulty::required_bits(store, record, record.height + 1, &self.config.params)
        })
    }

    fn chain_tip(&self) -> RelayResult<ChainTip> {
        let store = self.store.read();
        let state = store.require_state()?;
        let head = store
            .get_block(&state.mainchain_head)?
            .ok_or(RelayError::UnknownBlock(state.mainchain_head))?;
        Ok(ChainTip {
            hash: head.hash,
            height: head.height,
            chain_work: head.cumulative_work(&self.config.params),
        })
    }

    fn verify_transaction(
        &self,
        tx_id: &Hash,
        block_hash: &Hash,
        proof: &[Hash],
        directions: &[Direction],
        min_confirmations: u64,
    ) -> RelayResult<bool> {
        self.with_record(block_hash, |store, record| {
            let got = Self::canonical_depth(store, record)?;
            if got < min_confirmations {
                return Err(RelayError::InsufficientConfirmations {
                    got,
                    required: min_confirmations,
                });
            }
            merkle_verifier::verify(proof, directions, &record.header.merkle_root, tx_id)
        })
    }
}
