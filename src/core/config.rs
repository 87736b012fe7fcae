//! # Bus configuration.
//!
//! Provides [`BusConfig`], the construction-time settings for an
//! [`EventBus`](crate::EventBus). Delivery mode and shard count are fixed for
//! the bus's lifetime.
//!
//! ## Field semantics
//! - `shards`: lock granularity vs. memory (min 1; clamped)
//! - `delivery`: synchronous vs. asynchronous handler invocation
//! - `workers`: dispatch-pool size for async deliveries (min 1; clamped)
//! - `pool_capacity`: per-worker job queue depth (min 1; clamped)
//! - `shutdown`: drain or cancel in-flight async deliveries on shutdown
//!
//! ## Notes
//! All fields are public for flexibility. Prefer the clamping accessors over
//! reading fields directly when constructing runtime components.

/// How `publish` invokes handlers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Invoke each handler on the publisher's task, sequentially, before
    /// `publish` returns. A slow handler stalls the publisher and the rest of
    /// that publish's deliveries.
    Sync,
    /// Hand deliveries to the dispatch pool; `publish` returns without
    /// waiting. Queue handlers get a non-blocking fast path first.
    #[default]
    Async,
}

/// What happens to in-flight async deliveries on [`EventBus::shutdown`](crate::EventBus::shutdown).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShutdownPolicy {
    /// Complete every delivery already queued in the pool before returning.
    #[default]
    Drain,
    /// Stop workers immediately; queued and in-flight deliveries are
    /// discarded.
    Cancel,
}

/// Construction-time configuration for an [`EventBus`](crate::EventBus).
#[derive(Clone, Copy, Debug)]
pub struct BusConfig {
    /// Number of independent registry shards.
    ///
    /// Keys hash deterministically onto shards; more shards means less lock
    /// contention between unrelated keys at the cost of memory. Minimum 1.
    pub shards: usize,

    /// Delivery mode, fixed at construction.
    pub delivery: DeliveryMode,

    /// Number of dispatch-pool workers for async deliveries.
    ///
    /// The pool bounds concurrency: deliveries queue on workers instead of
    /// spawning one task per handler per event. Unused in sync mode.
    pub workers: usize,

    /// Capacity of each pool worker's job queue.
    ///
    /// When every worker's queue is full, further async deliveries are
    /// dropped and reported through the failure hook. Minimum 1.
    pub pool_capacity: usize,

    /// Shutdown behavior for the dispatch pool.
    pub shutdown: ShutdownPolicy,
}

impl BusConfig {
    /// Shard count clamped to a minimum of 1.
    #[inline]
    pub fn shards_clamped(&self) -> usize {
        self.shards.max(1)
    }

    /// Worker count clamped to a minimum of 1.
    #[inline]
    pub fn workers_clamped(&self) -> usize {
        self.workers.max(1)
    }

    /// Pool queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn pool_capacity_clamped(&self) -> usize {
        self.pool_capacity.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `shards = 32`
    /// - `delivery = Async`
    /// - `workers = 4`
    /// - `pool_capacity = 1024`
    /// - `shutdown = Drain`
    fn default() -> Self {
        Self {
            shards: 32,
            delivery: DeliveryMode::default(),
            workers: 4,
            pool_capacity: 1024,
            shutdown: ShutdownPolicy::default(),
        }
    }
}
