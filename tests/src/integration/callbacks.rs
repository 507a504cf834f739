//! # Publisher Callbacks
//!
//! Events are delivered after the store lock is released, so a publisher
//! can read or extend the relay from inside `publish`. No other writer
//! commits between a commit and the delivery of its events.

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex, OnceLock, Weak};
    use std::thread;
    use std::time::Duration;

    use spv_header_relay::{
        EventPublisher, HeaderRelayApi, HeaderRelayService, InMemoryKVStore, RelayConfig,
        RelayEvent,
    };

    use crate::fixtures::{bootstrap, extend, mine, raw, EASY_BITS, GENESIS_TIME};

    type QueryingRelay = HeaderRelayService<InMemoryKVStore, QueryingPublisher>;
    type SubmittingRelay = HeaderRelayService<InMemoryKVStore, SubmittingPublisher>;

    fn service<P: EventPublisher>(
        publisher: &Arc<P>,
    ) -> Arc<HeaderRelayService<InMemoryKVStore, P>> {
        Arc::new(
            HeaderRelayService::new(
                RelayConfig::for_testing(),
                InMemoryKVStore::new(),
                Arc::clone(publisher),
            )
            .unwrap(),
        )
    }

    /// Runs `work` on its own thread and fails instead of hanging.
    fn within_deadline<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> T {
        let (done, finished) = mpsc::channel();
        let worker = thread::spawn(move || done.send(work()).unwrap());
        let value = finished
            .recv_timeout(Duration::from_secs(10))
            .expect("relay blocked while publishing");
        worker.join().unwrap();
        value
    }

    /// Reads the mainchain height back through the relay on every head change.
    #[derive(Default)]
    struct QueryingPublisher {
        relay: OnceLock<Weak<QueryingRelay>>,
        observed: Mutex<Vec<(u64, u64)>>,
    }

    impl EventPublisher for QueryingPublisher {
        fn publish(&self, event: RelayEvent) {
            let RelayEvent::HeadChanged { height, .. } = event else {
                return;
            };
            let Some(relay) = self.relay.get().and_then(Weak::upgrade) else {
                return;
            };
            let seen = relay.mainchain_height().unwrap();
            self.observed.lock().unwrap().push((height, seen));
        }
    }

    /// Submits one prepared header from inside `publish`.
    #[derive(Default)]
    struct SubmittingPublisher {
        relay: OnceLock<Weak<SubmittingRelay>>,
        pending: Mutex<Option<Vec<u8>>>,
        nested: Mutex<Option<u64>>,
    }

    impl EventPublisher for SubmittingPublisher {
        fn publish(&self, _event: RelayEvent) {
            let Some(next) = self.pending.lock().unwrap().take() else {
                return;
            };
            let Some(relay) = self.relay.get().and_then(Weak::upgrade) else {
                return;
            };
            let outcome = relay.submit_header(&next).unwrap();
            *self.nested.lock().unwrap() = Some(outcome.height);
        }
    }

    #[test]
    fn test_publisher_can_query_relay_on_head_change() {
        let publisher = Arc::new(QueryingPublisher::default());
        let relay = service(&publisher);
        assert!(publisher.relay.set(Arc::downgrade(&relay)).is_ok());

        let head = within_deadline({
            let relay = Arc::clone(&relay);
            move || {
                let mut parent = bootstrap(&*relay);
                for i in 1..=3u32 {
                    parent = extend(&*relay, &parent, 1, GENESIS_TIME + i * 600).unwrap().hash;
                }
                parent
            }
        });

        assert_eq!(relay.mainchain_head().unwrap(), head);
        assert_eq!(
            *publisher.observed.lock().unwrap(),
            vec![(0, 0), (1, 1), (2, 2), (3, 3)]
        );
    }

    #[test]
    fn test_querying_publisher_with_concurrent_writers() {
        let publisher = Arc::new(QueryingPublisher::default());
        let relay = service(&publisher);
        assert!(publisher.relay.set(Arc::downgrade(&relay)).is_ok());
        let genesis = bootstrap(&*relay);

        within_deadline({
            let relay = Arc::clone(&relay);
            move || {
                let writers: Vec<_> = (1..=3u8)
                    .map(|tag| {
                        let relay = Arc::clone(&relay);
                        thread::spawn(move || {
                            let mut parent = genesis;
                            for i in 1..=5u32 {
                                let time = GENESIS_TIME + i * 600 + u32::from(tag);
                                parent = extend(&*relay, &parent, tag, time).unwrap().hash;
                            }
                        })
                    })
                    .collect();
                for writer in writers {
                    writer.join().unwrap();
                }
            }
        });

        // Each head change is read back before any later commit
        let observed = publisher.observed.lock().unwrap().clone();
        assert!(observed.iter().all(|(height, seen)| height == seen));
        assert!(observed.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(relay.mainchain_height().unwrap(), 5);
    }

    #[test]
    fn test_publisher_can_submit_from_callback() {
        let publisher = Arc::new(SubmittingPublisher::default());
        let relay = service(&publisher);
        assert!(publisher.relay.set(Arc::downgrade(&relay)).is_ok());
        let genesis_hash = bootstrap(&*relay);

        let first = mine(genesis_hash, 1, GENESIS_TIME + 600, EASY_BITS);
        let second = mine(first.hash(), 1, GENESIS_TIME + 1200, EASY_BITS);
        *publisher.pending.lock().unwrap() = Some(raw(&second));

        let outcome = within_deadline({
            let relay = Arc::clone(&relay);
            move || relay.submit_header(&raw(&first)).unwrap()
        });

        assert_eq!(outcome.height, 1);
        assert_eq!(*publisher.nested.lock().unwrap(), Some(2));
        assert_eq!(relay.mainchain_height().unwrap(), 2);
        assert_eq!(relay.mainchain_head().unwrap(), second.hash());
    }
}
