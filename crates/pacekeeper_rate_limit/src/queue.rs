//! One-at-a-time call queue in front of a [`ManualWaiter`].

use crate::manual::DepthProbe;
use crate::{CallCounts, ManualWaiter};
use futures::future::BoxFuture;
use pacekeeper_error::{QueueError, QueueErrorKind};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Whether a queue currently has a drain loop running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DrainState {
    /// No drain loop; the next enqueue starts one.
    #[display("idle")]
    Idle,
    /// A drain loop is consuming the queue.
    #[display("draining")]
    Draining,
}

struct QueueInner {
    pending: VecDeque<Job>,
    state: DrainState,
}

/// Runs calls strictly in the order they were enqueued, one at a time,
/// pacing each through a [`ManualWaiter`] first.
///
/// At most one drain loop runs per queue. Enqueueing while it runs only
/// appends to the queue; the loop picks the call up in turn. Once the
/// queue empties the loop exits and the queue is idle again.
///
/// Clones share the same queue.
///
/// # Example
///
/// ```rust,no_run
/// use pacekeeper_rate_limit::{CallQueue, ManualLimitConfig, ManualWaiter};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = CallQueue::new(ManualWaiter::new(
///     ManualLimitConfig::builder().minutely_limit(30).build(),
/// ));
///
/// let first = queue.enqueue(|| async { "first" });
/// let second = queue.enqueue(|| async { "second" });
/// assert_eq!(first.await?, "first");
/// assert_eq!(second.await?, "second");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CallQueue {
    waiter: Arc<ManualWaiter>,
    inner: Arc<Mutex<QueueInner>>,
}

impl CallQueue {
    /// Create an idle queue pacing calls through `waiter`.
    pub fn new(waiter: ManualWaiter) -> Self {
        Self {
            waiter: Arc::new(waiter),
            inner: Arc::new(Mutex::new(QueueInner {
                pending: VecDeque::new(),
                state: DrainState::Idle,
            })),
        }
    }

    /// The waiter pacing this queue.
    pub fn waiter(&self) -> &ManualWaiter {
        &self.waiter
    }

    /// Current counters of the underlying waiter.
    pub fn counts(&self) -> CallCounts {
        self.waiter.counts()
    }

    /// Calls waiting to be admitted, excluding one currently running.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Current drain state.
    pub fn state(&self) -> DrainState {
        self.inner.lock().state
    }

    /// Whether a drain loop is running.
    pub fn is_draining(&self) -> bool {
        self.state() == DrainState::Draining
    }

    /// Append `call` to the queue and return a handle to its result.
    ///
    /// The call starts only after every call enqueued before it has
    /// finished and the waiter has admitted it. Dropping the returned
    /// handle does not remove the call from the queue.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[instrument(skip_all)]
    pub fn enqueue<F, Fut, T>(&self, call: F) -> QueuedCall<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let output = call().await;
                // The caller may have stopped listening; the call still ran.
                let _ = tx.send(output);
            })
        });

        let start_drain = {
            let mut inner = self.inner.lock();
            inner.pending.push_back(job);
            debug!(pending = inner.pending.len(), state = %inner.state, "Call enqueued");
            match inner.state {
                DrainState::Idle => {
                    inner.state = DrainState::Draining;
                    true
                }
                DrainState::Draining => false,
            }
        };

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.waiter), Arc::clone(&self.inner)));
        }

        QueuedCall { rx }
    }

    /// Enqueue `call` and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns [`QueueErrorKind::Dropped`] if the call panicked or was torn
    /// down before producing a value.
    pub async fn run<F, Fut, T>(&self, call: F) -> Result<T, QueueError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.enqueue(call).await
    }
}

impl fmt::Debug for CallQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (pending, state) = {
            let inner = self.inner.lock();
            (inner.pending.len(), inner.state)
        };
        f.debug_struct("CallQueue")
            .field("waiter", &self.waiter)
            .field("pending", &pending)
            .field("state", &state)
            .finish()
    }
}

#[instrument(skip_all)]
async fn drain(waiter: Arc<ManualWaiter>, inner: Arc<Mutex<QueueInner>>) {
    debug!("Drain loop started");
    let pending = || inner.lock().pending.len();
    let depth: DepthProbe<'_> = &pending;

    loop {
        // Popping and going idle share one lock so no enqueue is stranded.
        let job = {
            let mut guard = inner.lock();
            match guard.pending.pop_front() {
                Some(job) => job,
                None => {
                    guard.state = DrainState::Idle;
                    break;
                }
            }
        };

        let counts = waiter.admit(Some(depth)).await;
        debug!(total_calls = counts.total_calls, "Running queued call");

        // Its own task, so a panicking call cannot take the loop down with it.
        if let Err(e) = tokio::spawn(job()).await {
            warn!(error = %e, "Queued call failed to complete");
        }
    }

    debug!("Drain loop finished, queue idle");
}

/// Handle to the result of a queued call.
///
/// Resolves once the call has run.
#[derive(Debug)]
#[must_use = "the call runs regardless, but its result is lost unless awaited"]
pub struct QueuedCall<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for QueuedCall<T> {
    type Output = Result<T, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| QueueError::new(QueueErrorKind::Dropped)))
    }
}
