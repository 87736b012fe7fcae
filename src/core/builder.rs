//! Builder for constructing an [`EventBus`](crate::EventBus) with optional features.

use std::sync::Arc;

use crate::core::bus::EventBus;
use crate::core::config::BusConfig;
use crate::core::dispatch::{DeliveryFailure, FailureHook};

/// Builder for an [`EventBus`].
///
/// Obtained via [`EventBus::builder`]; [`EventBus::new`] is the shorthand for
/// a bus without a failure hook.
pub struct BusBuilder {
    config: BusConfig,
    hook: Option<FailureHook>,
}

impl BusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(config: BusConfig) -> Self {
        Self { config, hook: None }
    }

    /// Installs an observer for failed deliveries.
    ///
    /// The hook sees dropped and panicked deliveries (pool overflow, closed
    /// queue receivers, handler panics). It runs on whichever task detects
    /// the failure, so it must be fast and must not panic.
    pub fn with_failure_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DeliveryFailure) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Builds the bus, spawning the dispatch pool when the delivery mode is
    /// asynchronous.
    pub fn build(self) -> EventBus {
        EventBus::new_internal(self.config, self.hook)
    }
}
