//! # Queue-backed handler (`Queue`)
//!
//! [`Queue`] turns a subscription into a message stream: receiving an event
//! means enqueuing it, and the consumer drains the paired receiver at its own
//! pace.
//!
//! ## Delivery on an async bus
//! The bus first attempts a non-blocking `try_send` on the publisher's task.
//! If the queue is full, the blocking enqueue is performed by a dispatch-pool
//! worker instead, so a slow consumer never stalls the publisher. Events are
//! not dropped on overflow; they wait in the pool until the consumer makes
//! room.
//!
//! ## Example
//! ```rust
//! use eventbus::Queue;
//!
//! let (handler, mut rx) = Queue::bounded(16);
//! // subscribe `handler`, then:
//! // while let Some(ev) = rx.recv().await { ... }
//! # let _ = (handler, &mut rx);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::events::Event;

use super::receive::{Receive, TryDeliver};

enum Sender {
    Bounded(mpsc::Sender<Arc<dyn Event>>),
    Unbounded(mpsc::UnboundedSender<Arc<dyn Event>>),
}

/// Queue-backed handler implementation.
///
/// Wraps the send side of an mpsc channel; the paired receiver is handed to
/// the consumer at construction time.
pub struct Queue {
    tx: Sender,
}

impl Queue {
    /// Creates a bounded queue handler with the given capacity.
    ///
    /// Capacity is clamped to a minimum of 1 (tokio channels have no
    /// zero-capacity rendezvous mode).
    pub fn bounded(capacity: usize) -> (Arc<Self>, mpsc::Receiver<Arc<dyn Event>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Arc::new(Self {
                tx: Sender::Bounded(tx),
            }),
            rx,
        )
    }

    /// Creates an unbounded queue handler.
    ///
    /// Enqueuing never blocks and never overflows; memory use is bounded only
    /// by how far the consumer falls behind.
    pub fn unbounded() -> (Arc<Self>, mpsc::UnboundedReceiver<Arc<dyn Event>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                tx: Sender::Unbounded(tx),
            }),
            rx,
        )
    }
}

#[async_trait]
impl Receive for Queue {
    /// Blocking enqueue: waits for queue space.
    ///
    /// If the consumer dropped the receiver the event is discarded.
    async fn on_event(&self, event: Arc<dyn Event>) {
        match &self.tx {
            Sender::Bounded(tx) => {
                let _ = tx.send(event).await;
            }
            Sender::Unbounded(tx) => {
                let _ = tx.send(event);
            }
        }
    }

    fn name(&self) -> &'static str {
        "queue"
    }

    /// Non-blocking enqueue fast path.
    fn try_on_event(&self, event: &Arc<dyn Event>) -> TryDeliver {
        match &self.tx {
            Sender::Bounded(tx) => match tx.try_send(Arc::clone(event)) {
                Ok(()) => TryDeliver::Delivered,
                Err(mpsc::error::TrySendError::Full(_)) => TryDeliver::Busy,
                Err(mpsc::error::TrySendError::Closed(_)) => TryDeliver::Closed,
            },
            Sender::Unbounded(tx) => match tx.send(Arc::clone(event)) {
                Ok(()) => TryDeliver::Delivered,
                Err(_) => TryDeliver::Closed,
            },
        }
    }
}
