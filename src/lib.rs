//! # eventbus
//!
//! **eventbus** is an in-process publish/subscribe event bus for async Rust.
//!
//! Producers publish typed events without knowing which components consume
//! them; consumers subscribe to an event kind (optionally refined by a
//! subtype string) and are notified when a matching event is published. The
//! subscriber map is sharded across independent read/write locks, so
//! unrelated event kinds never contend with each other.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  Publishers (many):                            Consumers (many):
//!
//!  publish(Event) ──► routing key ("kind" or "kind.subtype")
//!                          │
//!                          ▼
//!          ┌───────────────────────────────┐
//!          │  Registry (sharded by key)    │
//!          │  shard = rolling_hash(key) %  │
//!          │          shard_count          │
//!          │  [RwLock₀][RwLock₁]…[RwLockₙ] │
//!          └──────────────┬────────────────┘
//!                         │ snapshot under read lock
//!                         ▼
//!                    Dispatcher
//!          Sync ──► handler.on_event().await   (publisher's task)
//!          Async ─► try_on_event fast path
//!                   └─ fallback ──► DispatchPool (bounded workers)
//!                                       ├─► worker 1 ─► on_event()
//!                                       └─► worker N ─► on_event()
//! ```
//!
//! ### Guarantees
//! - Operations on the **same** key are linearized by that key's shard lock:
//!   a subscribe that completes before a publish is visible to that publish.
//! - Operations on **different** keys proceed in parallel (modulo shard
//!   collisions, which only cost lock sharing, never correctness).
//! - `publish` works from a stable snapshot of the subscriber set taken under
//!   the shard read lock; the set never mutates mid-iteration.
//! - In async mode `publish` never blocks on a slow consumer: full queues
//!   fall back to a pool worker that performs the blocking enqueue.
//! - Handler panics are isolated per delivery and observable via the failure
//!   hook.
//!
//! ## Features
//! | Area           | Description                                             | Key types / traits            |
//! |----------------|---------------------------------------------------------|-------------------------------|
//! | **Events**     | Static kind tag + optional subtype; downcast helpers.   | [`Event`]                     |
//! | **Handlers**   | Closure, queue-backed, or custom consumers.             | [`Receive`], [`Callback`], [`Queue`] |
//! | **Bus**        | Subscribe / unsubscribe / publish façade.               | [`EventBus`], [`Subscription`] |
//! | **Delivery**   | Sync or async with a bounded dispatch pool.             | [`DeliveryMode`], [`BusConfig`] |
//! | **Lifecycle**  | Drain-or-cancel shutdown; closed-bus rejection.         | [`ShutdownPolicy`]            |
//! | **Errors**     | Typed recoverable errors; delivery-failure observation. | [`BusError`], [`DeliveryFailure`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use eventbus::{BusConfig, Callback, DeliveryMode, Event, EventBus};
//!
//! struct Ping;
//!
//! impl Event for Ping {
//!     fn kind(&self) -> &'static str {
//!         "ping"
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eventbus::BusError> {
//!     let bus = EventBus::new(BusConfig {
//!         delivery: DeliveryMode::Sync,
//!         ..BusConfig::default()
//!     });
//!
//!     let hits = Arc::new(AtomicUsize::new(0));
//!     let counter = Arc::clone(&hits);
//!     let handler = Callback::arc(move |_ev: Arc<dyn Event>| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!     });
//!
//!     let subscription = bus.subscribe(&Ping, handler).await?;
//!     bus.publish(Ping).await?;
//!     assert_eq!(hits.load(Ordering::SeqCst), 1);
//!
//!     bus.unsubscribe(subscription).await?;
//!     bus.shutdown().await;
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod handlers;
mod registry;

// ---- Public re-exports ----

pub use core::{
    BusBuilder, BusConfig, DeliveryFailure, DeliveryMode, EventBus, FailureHook, FailureReason,
    ShutdownPolicy,
};
pub use error::BusError;
pub use events::Event;
pub use handlers::{Callback, Queue, Receive, TryDeliver};
pub use registry::Subscription;
