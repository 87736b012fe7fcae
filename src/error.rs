//! Error types used by the bus.
//!
//! The core operations are expected to be fast and non-failing; the only
//! caller-visible error conditions are unsubscribing from a key nobody has
//! ever subscribed to, and using a bus after shutdown. Handler-side delivery
//! failures are not errors of the bus API - they are reported through the
//! failure hook (see [`DeliveryFailure`](crate::DeliveryFailure)).

use thiserror::Error;

/// # Errors produced by bus operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Unsubscribe targeted a routing key with no subscriber set.
    ///
    /// Distinct from removing a handler that is simply not a member of an
    /// existing set, which is a silent no-op. Recoverable; unrelated keys'
    /// state is unaffected.
    #[error("no subscriptions exist for routing key '{key}'")]
    RoutingKeyNotFound {
        /// The routing key that was never subscribed to.
        key: String,
    },

    /// The bus has been shut down; publish and subscribe are rejected.
    #[error("bus is shut down")]
    Closed,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventbus::BusError;
    ///
    /// let err = BusError::RoutingKeyNotFound { key: "ping".into() };
    /// assert_eq!(err.as_label(), "routing_key_not_found");
    /// assert_eq!(BusError::Closed.as_label(), "bus_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::RoutingKeyNotFound { .. } => "routing_key_not_found",
            BusError::Closed => "bus_closed",
        }
    }
}
