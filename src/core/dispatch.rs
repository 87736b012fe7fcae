//! # Dispatch pool: bounded workers for async deliveries.
//!
//! [`DispatchPool`] executes deliveries that cannot complete on the
//! publisher's task: generic handler invocations in async mode and blocking
//! enqueues for full queue handlers. A fixed set of workers with bounded job
//! queues caps resource usage under high publish rates - no per-event task
//! spawning.
//!
//! ## Diagram
//! ```text
//!    publish (async mode)
//!        │  try_on_event fast path, then:
//!        │        (round-robin submit)
//!        ├────────────────► [queue W1] ─► worker W1 ─► on_event()
//!        ├────────────────► [queue W2] ─► worker W2 ─► on_event()
//!        └────────────────► [queue WN] ─► worker WN ─► on_event()
//! ```
//!
//! ## Rules
//! - `submit` never blocks: it rotates over workers once; if every queue is
//!   full the job is rejected and reported as [`FailureReason::Overflow`].
//! - Panics inside handlers are caught per delivery and reported as
//!   [`FailureReason::Panicked`]; the worker keeps running.
//! - Shutdown either drains (a `Stop` sentinel behind the queued jobs) or
//!   cancels (token aborts queued and in-flight deliveries), per
//!   [`ShutdownPolicy`](crate::ShutdownPolicy).

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::ShutdownPolicy;
use crate::events::Event;
use crate::handlers::Receive;

/// Why a delivery attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The handler panicked while processing the event.
    Panicked(String),
    /// A queue handler's receiver was dropped; the event had nowhere to go.
    QueueClosed,
    /// Every pool worker's queue was full; the delivery was dropped.
    Overflow,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Panicked(msg) => write!(f, "panicked: {msg}"),
            FailureReason::QueueClosed => write!(f, "queue closed"),
            FailureReason::Overflow => write!(f, "dispatch pool overflow"),
        }
    }
}

/// A delivery that did not reach its handler.
///
/// Passed to the failure hook installed via
/// [`BusBuilder::with_failure_hook`](crate::BusBuilder::with_failure_hook).
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    /// Name of the handler the delivery was addressed to.
    pub handler: &'static str,
    /// Routing key of the event.
    pub key: String,
    /// What went wrong.
    pub reason: FailureReason,
}

/// Observer for failed deliveries.
///
/// Pure fire-and-forget makes delivery outcomes unobservable; installing a
/// hook restores visibility without adding backpressure to publishers.
pub type FailureHook = Arc<dyn Fn(&DeliveryFailure) + Send + Sync>;

/// Reports a failure through the hook, or to stderr when none is installed.
pub(crate) fn report(hook: Option<&FailureHook>, failure: DeliveryFailure) {
    match hook {
        Some(hook) => hook(&failure),
        None => eprintln!(
            "[eventbus] handler '{}' delivery failed for '{}': {}",
            failure.handler, failure.key, failure.reason
        ),
    }
}

/// Unit of work for a pool worker.
pub(crate) enum Job {
    /// Deliver `event` to `handler` (blocking enqueue or full invocation).
    Deliver {
        handler: Arc<dyn Receive>,
        event: Arc<dyn Event>,
        key: Arc<str>,
    },
    /// Drain sentinel: the worker exits once it reaches this job.
    Stop,
}

/// Fixed-size worker pool with per-worker bounded job queues.
pub(crate) struct DispatchPool {
    workers: Vec<mpsc::Sender<Job>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    next: AtomicUsize,
    cancel: CancellationToken,
}

impl DispatchPool {
    /// Spawns `workers` workers, each with a job queue of `capacity`.
    pub(crate) fn new(workers: usize, capacity: usize, hook: Option<FailureHook>) -> Self {
        let cancel = CancellationToken::new();
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for _ in 0..workers {
            let (tx, rx) = mpsc::channel::<Job>(capacity);
            let token = cancel.clone();
            let hook = hook.clone();
            handles.push(tokio::spawn(worker_loop(rx, token, hook)));
            senders.push(tx);
        }

        Self {
            workers: senders,
            handles: Mutex::new(handles),
            next: AtomicUsize::new(0),
            cancel,
        }
    }

    /// Submits a job without blocking.
    ///
    /// Rotates over the workers starting from a round-robin cursor; the first
    /// worker with queue space takes the job. Returns the job back when every
    /// queue is full or closed.
    pub(crate) fn submit(&self, job: Job) -> Result<(), Job> {
        let n = self.workers.len();
        let start = self.next.fetch_add(1, AtomicOrdering::Relaxed);

        let mut job = job;
        for i in 0..n {
            match self.workers[(start + i) % n].try_send(job) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::TrySendError::Full(rejected))
                | Err(mpsc::error::TrySendError::Closed(rejected)) => job = rejected,
            }
        }
        Err(job)
    }

    /// Stops the pool and joins its workers.
    ///
    /// - [`ShutdownPolicy::Drain`]: a `Stop` sentinel is queued behind each
    ///   worker's pending jobs, so everything already accepted is delivered.
    /// - [`ShutdownPolicy::Cancel`]: workers stop at once; queued and
    ///   in-flight deliveries are discarded.
    pub(crate) async fn shutdown(&self, policy: ShutdownPolicy) {
        match policy {
            ShutdownPolicy::Cancel => self.cancel.cancel(),
            ShutdownPolicy::Drain => {
                for tx in &self.workers {
                    let _ = tx.send(Job::Stop).await;
                }
            }
        }

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    mut rx: mpsc::Receiver<Job>,
    cancel: CancellationToken,
    hook: Option<FailureHook>,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = rx.recv() => match job {
                None | Some(Job::Stop) => break,
                Some(Job::Deliver { handler, event, key }) => {
                    // Cancellation also aborts the in-flight delivery, so a
                    // handler parked on a full queue cannot stall shutdown.
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        () = deliver(handler, event, &key, hook.as_ref()) => {}
                    }
                }
            },
        }
    }
}

/// Invokes a handler with panic isolation.
///
/// Used both by pool workers and by sync-mode publish: a panicking handler
/// terminates only its own delivery attempt and is reported, never propagated.
pub(crate) async fn deliver(
    handler: Arc<dyn Receive>,
    event: Arc<dyn Event>,
    key: &str,
    hook: Option<&FailureHook>,
) {
    let outcome = AssertUnwindSafe(handler.on_event(event)).catch_unwind().await;
    if let Err(panic_err) = outcome {
        report(
            hook,
            DeliveryFailure {
                handler: handler.name(),
                key: key.to_string(),
                reason: FailureReason::Panicked(panic_message(panic_err.as_ref())),
            },
        );
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
