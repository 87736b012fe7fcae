//! # Handler capability trait.
//!
//! Provides [`Receive`], the extension point for plugging consumers into the
//! bus. Anything implementing it can be subscribed; the crate ships two
//! built-ins ([`Callback`](crate::Callback) and [`Queue`](crate::Queue)).
//!
//! ## Delivery contexts
//! - **Sync bus**: [`Receive::on_event`] runs on the publisher's task, one
//!   handler at a time, before `publish` returns.
//! - **Async bus**: delivery is handed to a dispatch-pool worker; `publish`
//!   does not wait for it. Handlers with a non-blocking fast path (queues)
//!   can accept the event directly via [`Receive::try_on_event`] and skip the
//!   pool entirely.
//!
//! ## Rules
//! - A slow handler on an async bus occupies one pool worker, never the
//!   publisher.
//! - Panics inside `on_event` are caught and reported; they terminate only
//!   that delivery attempt.
//! - The bus holds handlers behind `Arc` and drops its reference on
//!   unsubscribe; subscribing does not transfer ownership.

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::Event;

/// Outcome of a non-blocking delivery attempt ([`Receive::try_on_event`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryDeliver {
    /// The event was accepted; no further delivery work is needed.
    Delivered,
    /// The handler could not accept the event right now; deliver via a
    /// dispatch-pool worker instead.
    Busy,
    /// The handler can no longer accept events (e.g. its receiver was
    /// dropped); the delivery is abandoned.
    Closed,
}

/// Event consumer capability.
///
/// Implement this to receive events for the keys you subscribe to. The
/// default [`Receive::try_on_event`] reports [`TryDeliver::Busy`], which
/// routes every async delivery through the dispatch pool; override it only
/// when the handler has a genuinely non-blocking acceptance path.
#[async_trait]
pub trait Receive: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// On a sync bus this runs on the publisher's task; on an async bus it
    /// runs on a dispatch-pool worker. Either way, panics are caught and
    /// reported without affecting other handlers.
    async fn on_event(&self, event: Arc<dyn Event>);

    /// Returns the handler name used in failure reports.
    ///
    /// Prefer short, descriptive names. The default uses
    /// `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Attempts a non-blocking delivery.
    ///
    /// Called on the publisher's task in async mode before falling back to
    /// the pool. Must not block or await.
    fn try_on_event(&self, event: &Arc<dyn Event>) -> TryDeliver {
        let _ = event;
        TryDeliver::Busy
    }
}
