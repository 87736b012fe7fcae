//! # Closure-backed handler (`Callback`)
//!
//! [`Callback`] wraps a plain `Fn(Arc<dyn Event>)` closure so simple consumers
//! don't need a named type and a trait impl.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use eventbus::{Callback, Event};
//!
//! let handler = Callback::arc(|ev: Arc<dyn Event>| {
//!     println!("got {}", ev.kind());
//! });
//! // pass `handler` to EventBus::subscribe
//! # let _ = handler;
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::Event;

use super::receive::Receive;

/// Closure-backed handler implementation.
///
/// Each subscription of a distinct `Callback` value is a distinct
/// subscription, even when two callbacks wrap the same function.
pub struct Callback<F> {
    f: F,
}

impl<F> Callback<F>
where
    F: Fn(Arc<dyn Event>) + Send + Sync + 'static,
{
    /// Wraps a closure as a handler.
    ///
    /// Prefer [`Callback::arc`] when you immediately need an
    /// `Arc<dyn Receive>` for subscribing.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> Receive for Callback<F>
where
    F: Fn(Arc<dyn Event>) + Send + Sync + 'static,
{
    async fn on_event(&self, event: Arc<dyn Event>) {
        (self.f)(event);
    }

    fn name(&self) -> &'static str {
        "callback"
    }
}
