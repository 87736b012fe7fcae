//! # EventBus: the publish/subscribe façade.
//!
//! [`EventBus`] composes the routing-key resolver, the sharded subscription
//! registry and the dispatch pool into the three-operation surface:
//! subscribe, unsubscribe, publish.
//!
//! ## Architecture
//! ```text
//! publisher ── publish(Event) ──► routing_key ──► Registry shard (read lock)
//!                                                    │ snapshot
//!                                                    ▼
//!                                               Dispatcher
//!                          Sync: ── on_event().await per handler (caller's task)
//!                          Async: ─ try_on_event fast path ─► done
//!                                   └─ otherwise ─► DispatchPool worker
//! ```
//!
//! ## Snapshot contract
//! `publish` copies the subscriber set under the shard's **read** lock and
//! releases the lock before dispatching. An in-flight publish therefore
//! observes the set as of dispatch-start only: a subscribe or unsubscribe
//! that acquires the write lock afterwards takes effect for subsequent
//! publishes, never mid-iteration.
//!
//! ## Rules
//! - Concurrent publishes to the same key run side by side (shared lock);
//!   mutators for that key wait for the exclusive lock.
//! - No delivery order is defined across handlers, and async deliveries may
//!   complete in any order after `publish` returns.
//! - Handler failures never propagate to the publisher; they are reported
//!   through the failure hook (or stderr).
//! - After [`EventBus::shutdown`], publish and subscribe return
//!   [`BusError::Closed`]; unsubscribe keeps working so callers can clean up.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use crate::core::builder::BusBuilder;
use crate::core::config::{BusConfig, DeliveryMode, ShutdownPolicy};
use crate::core::dispatch::{self, DeliveryFailure, DispatchPool, FailureHook, FailureReason, Job};
use crate::error::BusError;
use crate::events::{Event, routing_key};
use crate::handlers::{Receive, TryDeliver};
use crate::registry::{Registry, Subscription};

/// In-process publish/subscribe event bus.
///
/// Each bus instance is fully isolated: its own registry, its own shard
/// locks, its own dispatch pool. Construct one at your composition root and
/// pass it by reference; there is no process-wide default instance.
///
/// All operations are safe to call from arbitrary concurrent tasks without
/// external synchronization.
pub struct EventBus {
    registry: Registry,
    mode: DeliveryMode,
    shutdown_policy: ShutdownPolicy,
    pool: Option<DispatchPool>,
    hook: Option<FailureHook>,
    closed: AtomicBool,
}

impl EventBus {
    /// Creates a bus from the given configuration.
    pub fn new(config: BusConfig) -> Self {
        BusBuilder::new(config).build()
    }

    /// Returns a builder for a bus with optional features (failure hook).
    pub fn builder(config: BusConfig) -> BusBuilder {
        BusBuilder::new(config)
    }

    pub(crate) fn new_internal(config: BusConfig, hook: Option<FailureHook>) -> Self {
        let pool = match config.delivery {
            DeliveryMode::Async => Some(DispatchPool::new(
                config.workers_clamped(),
                config.pool_capacity_clamped(),
                hook.clone(),
            )),
            DeliveryMode::Sync => None,
        };

        Self {
            registry: Registry::new(config.shards_clamped()),
            mode: config.delivery,
            shutdown_policy: config.shutdown,
            pool,
            hook,
            closed: AtomicBool::new(false),
        }
    }

    /// Registers `handler` for the routing key derived from `witness`.
    ///
    /// The witness event is used only to resolve the key; it is not
    /// delivered. Subscribing the same handler `Arc` to the same key again
    /// returns a handle to the existing subscription (no double delivery).
    ///
    /// Returns [`BusError::Closed`] after shutdown.
    pub async fn subscribe(
        &self,
        witness: &dyn Event,
        handler: Arc<dyn Receive>,
    ) -> Result<Subscription, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let key = routing_key(witness);
        Ok(self.registry.subscribe(&key, handler).await)
    }

    /// Deregisters a subscription.
    ///
    /// Returns [`BusError::RoutingKeyNotFound`] when the subscription's key
    /// has never been subscribed to on this bus. Permitted after shutdown.
    pub async fn unsubscribe(&self, subscription: Subscription) -> Result<(), BusError> {
        self.registry.unsubscribe(&subscription).await
    }

    /// Publishes an event to every handler currently subscribed to its key.
    ///
    /// See the module docs for the snapshot contract and per-mode delivery
    /// semantics. Returns [`BusError::Closed`] after shutdown; otherwise the
    /// call itself cannot fail (delivery failures go to the failure hook).
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), BusError> {
        self.publish_arc(Arc::new(event)).await
    }

    /// Publishes an already-shared event without re-wrapping it.
    ///
    /// Useful when the same event value is published on several buses or
    /// retained by the caller.
    pub async fn publish_arc(&self, event: Arc<dyn Event>) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let key: Arc<str> = routing_key(event.as_ref()).into();
        let handlers = self.registry.snapshot(&key).await;

        for handler in handlers {
            match self.mode {
                DeliveryMode::Sync => {
                    dispatch::deliver(handler, Arc::clone(&event), &key, self.hook.as_ref()).await;
                }
                DeliveryMode::Async => {
                    self.dispatch_async(handler, Arc::clone(&event), &key);
                }
            }
        }
        Ok(())
    }

    /// Two-tier async delivery: fast path on the publisher's task, pool
    /// fallback when the handler cannot accept the event non-blocking.
    fn dispatch_async(&self, handler: Arc<dyn Receive>, event: Arc<dyn Event>, key: &Arc<str>) {
        match handler.try_on_event(&event) {
            TryDeliver::Delivered => {}
            TryDeliver::Closed => dispatch::report(
                self.hook.as_ref(),
                DeliveryFailure {
                    handler: handler.name(),
                    key: key.to_string(),
                    reason: FailureReason::QueueClosed,
                },
            ),
            TryDeliver::Busy => {
                let Some(pool) = self.pool.as_ref() else {
                    return;
                };
                let name = handler.name();
                let job = Job::Deliver {
                    handler,
                    event,
                    key: Arc::clone(key),
                };
                if pool.submit(job).is_err() {
                    dispatch::report(
                        self.hook.as_ref(),
                        DeliveryFailure {
                            handler: name,
                            key: key.to_string(),
                            reason: FailureReason::Overflow,
                        },
                    );
                }
            }
        }
    }

    /// Stops the bus.
    ///
    /// Sets the closed flag (further publish/subscribe calls are rejected),
    /// then stops the dispatch pool per the configured
    /// [`ShutdownPolicy`]: drain completes every queued async delivery before
    /// returning, cancel discards them. Idempotent; the second call returns
    /// immediately.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, AtomicOrdering::SeqCst) {
            return;
        }
        if let Some(pool) = self.pool.as_ref() {
            pool.shutdown(self.shutdown_policy).await;
        }
    }

    /// True once [`EventBus::shutdown`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(AtomicOrdering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{Callback, Queue};
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::timeout;

    struct Ping {
        urgent: bool,
    }

    impl Ping {
        fn plain() -> Self {
            Self { urgent: false }
        }

        fn urgent() -> Self {
            Self { urgent: true }
        }
    }

    impl Event for Ping {
        fn kind(&self) -> &'static str {
            "ping"
        }

        fn subtype(&self) -> &str {
            if self.urgent { "urgent" } else { "" }
        }
    }

    struct Pong;

    impl Event for Pong {
        fn kind(&self) -> &'static str {
            "pong"
        }
    }

    fn sync_bus() -> EventBus {
        EventBus::new(BusConfig {
            delivery: DeliveryMode::Sync,
            ..BusConfig::default()
        })
    }

    fn counting_handler() -> (Arc<dyn Receive>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let handler = Callback::arc(move |_ev: Arc<dyn Event>| {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });
        (handler, hits)
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        timeout(Duration::from_secs(2), async {
            while counter.load(AtomicOrdering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("expected count not reached in time");
    }

    #[tokio::test]
    async fn test_sync_publish_counts_exactly_five() {
        let bus = sync_bus();
        let (handler, hits) = counting_handler();
        let _ = bus.subscribe(&Ping::plain(), handler).await.unwrap();

        for _ in 0..5 {
            bus.publish(Ping::plain()).await.unwrap();
        }
        // Sync mode: all deliveries completed before the last publish returned.
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_subtype_isolation() {
        let bus = sync_bus();
        let (plain_handler, plain_hits) = counting_handler();
        let (urgent_handler, urgent_hits) = counting_handler();

        let _ = bus.subscribe(&Ping::plain(), plain_handler).await.unwrap();
        let _ = bus.subscribe(&Ping::urgent(), urgent_handler).await.unwrap();

        bus.publish(Ping::plain()).await.unwrap();
        assert_eq!(plain_hits.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(urgent_hits.load(AtomicOrdering::SeqCst), 0);

        bus.publish(Ping::urgent()).await.unwrap();
        assert_eq!(plain_hits.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(urgent_hits.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_kinds_are_isolated() {
        let bus = sync_bus();
        let (handler, hits) = counting_handler();
        let _ = bus.subscribe(&Ping::plain(), handler).await.unwrap();

        bus.publish(Pong).await.unwrap();
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fanout_delivers_to_all_handlers() {
        let bus = sync_bus();
        let (a, a_hits) = counting_handler();
        let (b, b_hits) = counting_handler();

        let _ = bus.subscribe(&Ping::plain(), a).await.unwrap();
        let _ = bus.subscribe(&Ping::plain(), b).await.unwrap();

        bus.publish(Ping::plain()).await.unwrap();
        assert_eq!(a_hits.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(b_hits.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resubscribing_same_handler_does_not_double_deliver() {
        let bus = sync_bus();
        let (handler, hits) = counting_handler();

        let first = bus
            .subscribe(&Ping::plain(), Arc::clone(&handler))
            .await
            .unwrap();
        let second = bus.subscribe(&Ping::plain(), handler).await.unwrap();
        assert_eq!(first.id(), second.id());

        bus.publish(Ping::plain()).await.unwrap();
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery_others_unaffected() {
        let bus = sync_bus();
        let (a, a_hits) = counting_handler();
        let (b, b_hits) = counting_handler();

        let sub_a = bus.subscribe(&Ping::plain(), a).await.unwrap();
        let _ = bus.subscribe(&Ping::plain(), b).await.unwrap();

        bus.publish(Ping::plain()).await.unwrap();
        bus.unsubscribe(sub_a).await.unwrap();
        bus.publish(Ping::plain()).await.unwrap();

        assert_eq!(a_hits.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(b_hits.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_key_is_recoverable() {
        let bus = sync_bus();
        let (handler, _hits) = counting_handler();
        let sub = bus.subscribe(&Ping::plain(), handler).await.unwrap();
        // Move the subscription onto a key the bus has never seen by using a
        // second bus; its registry has no set for "ping".
        let other = sync_bus();
        let err = other.unsubscribe(sub).await.unwrap_err();
        assert!(matches!(err, BusError::RoutingKeyNotFound { ref key } if key == "ping"));

        // The failed unsubscribe did not disturb the original bus.
        bus.publish(Ping::plain()).await.unwrap();
    }

    #[tokio::test]
    async fn test_async_callback_delivery_completes() {
        let bus = EventBus::new(BusConfig::default());
        let (handler, hits) = counting_handler();
        let _ = bus.subscribe(&Ping::plain(), handler).await.unwrap();

        bus.publish(Ping::plain()).await.unwrap();
        wait_for(&hits, 1).await;
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_async_queue_overflow_fallback_loses_nothing() {
        let bus = EventBus::new(BusConfig::default());
        let (queue, mut rx) = Queue::bounded(1);
        let _ = bus.subscribe(&Ping::plain(), queue).await.unwrap();

        // Three rapid publishes against a capacity-1 queue: the first takes
        // the fast path, the rest fall back to pool workers. None may block
        // or fail.
        for _ in 0..3 {
            bus.publish(Ping::plain()).await.unwrap();
        }

        for _ in 0..3 {
            let ev = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("queue delivery timed out")
                .expect("queue closed early");
            assert_eq!(ev.kind(), "ping");
        }
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_sync_panic_isolated_and_reported() {
        let failures: Arc<Mutex<Vec<DeliveryFailure>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failures);
        let bus = EventBus::builder(BusConfig {
            delivery: DeliveryMode::Sync,
            ..BusConfig::default()
        })
        .with_failure_hook(move |failure| {
            sink.lock().unwrap().push(failure.clone());
        })
        .build();

        let boom = Callback::arc(|_ev: Arc<dyn Event>| panic!("handler blew up"));
        let (fine, hits) = counting_handler();

        let _ = bus.subscribe(&Ping::plain(), boom).await.unwrap();
        let _ = bus.subscribe(&Ping::plain(), fine).await.unwrap();

        bus.publish(Ping::plain()).await.unwrap();

        // The panic terminated only its own delivery; the other handler and
        // the publisher were unaffected.
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 1);
        let seen = failures.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].reason,
            FailureReason::Panicked("handler blew up".to_string())
        );
    }

    #[tokio::test]
    async fn test_closed_queue_receiver_reported() {
        let failures: Arc<Mutex<Vec<DeliveryFailure>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&failures);
        let bus = EventBus::builder(BusConfig::default())
            .with_failure_hook(move |failure| {
                sink.lock().unwrap().push(failure.clone());
            })
            .build();

        let (queue, rx) = Queue::bounded(1);
        let _ = bus.subscribe(&Ping::plain(), queue).await.unwrap();
        drop(rx);

        bus.publish(Ping::plain()).await.unwrap();
        let seen = failures.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].reason, FailureReason::QueueClosed);
        drop(seen);
        bus.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_rejects_publish_and_subscribe() {
        let bus = sync_bus();
        let (handler, _hits) = counting_handler();
        let sub = bus.subscribe(&Ping::plain(), handler).await.unwrap();

        bus.shutdown().await;
        assert!(bus.is_closed());

        assert!(matches!(
            bus.publish(Ping::plain()).await,
            Err(BusError::Closed)
        ));
        let (late, _late_hits) = counting_handler();
        assert!(matches!(
            bus.subscribe(&Ping::plain(), late).await,
            Err(BusError::Closed)
        ));

        // Cleanup is still permitted.
        bus.unsubscribe(sub).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_deliveries() {
        struct Slow {
            hits: Arc<AtomicUsize>,
        }
        #[async_trait::async_trait]
        impl Receive for Slow {
            async fn on_event(&self, _event: Arc<dyn Event>) {
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.hits.fetch_add(1, AtomicOrdering::SeqCst);
            }
        }

        let bus = EventBus::new(BusConfig::default());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Slow {
            hits: Arc::clone(&hits),
        });
        let _ = bus.subscribe(&Ping::plain(), handler).await.unwrap();

        for _ in 0..3 {
            bus.publish(Ping::plain()).await.unwrap();
        }
        bus.shutdown().await;
        // Drain policy: everything accepted before shutdown was delivered.
        assert_eq!(hits.load(AtomicOrdering::SeqCst), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_churn_preserves_registry_integrity() {
        let bus = Arc::new(sync_bus());
        let (persistent, persistent_hits) = counting_handler();
        let _ = bus.subscribe(&Ping::plain(), persistent).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let bus = Arc::clone(&bus);
            tasks.push(tokio::spawn(async move {
                for _ in 0..25 {
                    let (handler, _hits) = {
                        let hits = Arc::new(AtomicUsize::new(0));
                        let counter = Arc::clone(&hits);
                        (
                            Callback::arc(move |_ev: Arc<dyn Event>| {
                                counter.fetch_add(1, AtomicOrdering::SeqCst);
                            }),
                            hits,
                        )
                    };
                    let sub = bus.subscribe(&Ping::plain(), handler).await.unwrap();
                    bus.publish(Ping::plain()).await.unwrap();
                    bus.publish(Ping::urgent()).await.unwrap();
                    bus.unsubscribe(sub).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        // Net effect of all the churn: only the persistent handler remains.
        assert_eq!(bus.registry.snapshot("ping").await.len(), 1);
        assert!(bus.registry.snapshot("ping.urgent").await.is_empty());
        // It saw every one of the 8 × 25 plain publishes.
        assert_eq!(persistent_hits.load(AtomicOrdering::SeqCst), 8 * 25);
    }
}
