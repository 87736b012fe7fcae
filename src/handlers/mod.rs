//! # Event handlers for the bus.
//!
//! This module provides the [`Receive`] trait and the built-in handler
//! implementations.
//!
//! ## Handler types
//! - [`Callback`] - closure-backed, runs inline in the delivery context
//! - [`Queue`] - channel-backed, hands events to a consumer-owned receiver
//! - **Custom** - any `impl Receive` supplied by the consumer
//!
//! ## Implementing custom handlers
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use eventbus::{Event, Receive};
//!
//! struct Metrics;
//!
//! #[async_trait]
//! impl Receive for Metrics {
//!     async fn on_event(&self, event: Arc<dyn Event>) {
//!         if event.kind() == "task.failed" {
//!             // increment failure counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "metrics" }
//! }
//! ```

mod callback;
mod queue;
mod receive;

pub use callback::Callback;
pub use queue::Queue;
pub use receive::{Receive, TryDeliver};
