//! Subscription storage: sharded locking and the key → handler-set map.
//!
//! Internal modules:
//! - [`shard`]: deterministic key → shard-index hashing;
//! - [`registry`]: the sharded subscriber map and [`Subscription`] handles.
//!
//! The only public API from this module is [`Subscription`]; the registry
//! itself is driven by [`EventBus`](crate::EventBus).

mod registry;
mod shard;

pub use registry::Subscription;

pub(crate) use registry::Registry;
