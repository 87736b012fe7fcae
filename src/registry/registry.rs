//! # Sharded subscription registry.
//!
//! [`Registry`] maps routing keys to their subscriber sets. The map is split
//! across a fixed number of shards, each guarded by its own
//! [`tokio::sync::RwLock`], so operations on unrelated keys proceed fully in
//! parallel while operations on the same key serialize on that key's shard.
//!
//! ## Rules
//! - All mutation and lookup happens under the shard lock for the key.
//! - Subscribe/unsubscribe take the **write** lock; snapshot takes the
//!   **read** lock, so concurrent publishes to one key run side by side but
//!   exclude mutators for that key.
//! - Subscriber sets are created lazily on first subscribe and stay resident
//!   once empty (the handlers themselves are removed; an empty set is a small,
//!   bounded overhead, not a leak).
//! - Keys that collide on one shard serialize with each other; an accepted
//!   tradeoff for keeping the lock count fixed.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use tokio::sync::RwLock;

use crate::error::BusError;
use crate::handlers::Receive;

use super::shard::shard_index;

/// Global sequence counter for subscription ids.
static SUB_SEQ: AtomicU64 = AtomicU64::new(0);

/// One registered handler within a key's subscriber set.
struct Entry {
    id: u64,
    handler: Arc<dyn Receive>,
}

type Shard = RwLock<HashMap<String, Vec<Entry>>>;

/// Opaque handle to an active subscription.
///
/// Returned by [`EventBus::subscribe`](crate::EventBus::subscribe) and
/// consumed by [`EventBus::unsubscribe`](crate::EventBus::unsubscribe).
/// The handle identifies the subscription explicitly instead of relying on
/// handler pointer identity, making "one handler, one subscription" checkable.
#[derive(Debug)]
#[must_use = "dropping a Subscription without unsubscribing leaves the handler registered"]
pub struct Subscription {
    id: u64,
    key: Arc<str>,
}

impl Subscription {
    /// The subscription's unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The routing key this subscription is registered under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Mapping from routing key to subscriber set, sharded by key hash.
pub(crate) struct Registry {
    shards: Box<[Shard]>,
}

impl Registry {
    /// Creates a registry with the given number of shards (min 1).
    pub(crate) fn new(shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, key: &str) -> &Shard {
        &self.shards[shard_index(key, self.shards.len())]
    }

    /// Registers `handler` under `key`, creating the set if absent.
    ///
    /// Re-subscribing the same handler `Arc` to the same key is a no-op that
    /// returns a handle to the existing subscription (set semantics: one
    /// handler is delivered to once per publish, regardless of how many times
    /// it was subscribed).
    pub(crate) async fn subscribe(&self, key: &str, handler: Arc<dyn Receive>) -> Subscription {
        let mut map = self.shard(key).write().await;
        let entries = map.entry(key.to_string()).or_default();

        if let Some(existing) = entries.iter().find(|e| Arc::ptr_eq(&e.handler, &handler)) {
            return Subscription {
                id: existing.id,
                key: key.into(),
            };
        }

        let id = SUB_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
        entries.push(Entry { id, handler });
        Subscription { id, key: key.into() }
    }

    /// Removes the subscription from its key's set.
    ///
    /// Returns [`BusError::RoutingKeyNotFound`] when no set exists for the key
    /// at all. Removing an id that is not a member of an existing set is a
    /// silent no-op ("nothing to remove" on a live key is benign).
    pub(crate) async fn unsubscribe(&self, subscription: &Subscription) -> Result<(), BusError> {
        let key = subscription.key();
        let mut map = self.shard(key).write().await;
        match map.get_mut(key) {
            Some(entries) => {
                entries.retain(|e| e.id != subscription.id);
                Ok(())
            }
            None => Err(BusError::RoutingKeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// Returns a stable copy of the current subscriber set for `key`.
    ///
    /// Taken under the shard's read lock and released before the caller
    /// dispatches; a mutator that wins the lock afterwards is not observed by
    /// an in-flight publish working from this snapshot.
    pub(crate) async fn snapshot(&self, key: &str) -> Vec<Arc<dyn Receive>> {
        let map = self.shard(key).read().await;
        map.get(key)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
            .unwrap_or_default()
    }
}
