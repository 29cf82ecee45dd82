//! Latest-request slot
//!
//! [`LatestRequest`] runs at most one request at a time. Issuing a new
//! request aborts the previous task, and a result only lands if its
//! generation is still the current one when it completes. Cancelling or
//! dropping the slot aborts whatever is in flight.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Observable state of a [`LatestRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState<T> {
    /// Nothing issued yet
    Idle,
    /// Request in flight
    Pending {
        /// Generation of the in-flight request
        generation: u64,
    },
    /// Latest request completed
    Ready {
        /// Generation that produced the value
        generation: u64,
        /// Result
        value: T,
    },
    /// Request was cancelled before completing
    Cancelled,
}

impl<T> RequestState<T> {
    /// Whether a request is in flight
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending { .. })
    }

    /// Completed value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            RequestState::Ready { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Slot holding the most recent request
pub struct LatestRequest<T> {
    generation: Arc<AtomicU64>,
    state_tx: Arc<watch::Sender<RequestState<T>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T> LatestRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an idle slot
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(RequestState::Idle);
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            state_tx: Arc::new(state_tx),
            task: Mutex::new(None),
        }
    }

    /// Start `request`, superseding any request in flight
    ///
    /// Must be called from within a tokio runtime. Returns the generation
    /// assigned to this request.
    pub fn issue<F>(&self, request: F) -> u64
    where
        F: Future<Output = T> + Send + 'static,
    {
        self.issue_with(request, |_| {})
    }

    /// Start `request` and run `on_ready` when its result lands
    ///
    /// `on_ready` runs under the same lock that issuing and cancelling take
    /// to bump the generation, so it never runs for a superseded or
    /// cancelled request. Keep it short and non-blocking.
    pub fn issue_with<F, C>(&self, request: F, on_ready: C) -> u64
    where
        F: Future<Output = T> + Send + 'static,
        C: FnOnce(&T) + Send + 'static,
    {
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let mut generation = 0;
        self.state_tx.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = RequestState::Pending { generation };
        });
        tracing::debug!(generation, "request issued");

        let current = Arc::clone(&self.generation);
        let state_tx = Arc::clone(&self.state_tx);
        *task = Some(tokio::spawn(async move {
            let value = request.await;
            state_tx.send_if_modified(|state| {
                if current.load(Ordering::SeqCst) != generation {
                    tracing::debug!(generation, "dropping stale result");
                    return false;
                }
                on_ready(&value);
                *state = RequestState::Ready { generation, value };
                true
            });
        }));

        generation
    }

    /// Abort the request in flight, if any
    ///
    /// A result that races the abort is discarded.
    pub fn cancel(&self) {
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        self.state_tx.send_if_modified(|state| {
            if !state.is_pending() {
                return false;
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = RequestState::Cancelled;
            true
        });
    }

    /// Current state
    pub fn state(&self) -> RequestState<T> {
        self.state_tx.borrow().clone()
    }

    /// Whether a request is in flight
    pub fn is_pending(&self) -> bool {
        self.state_tx.borrow().is_pending()
    }

    /// Generation of the most recent request
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Receive the state on every change
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state_tx.subscribe()
    }

    /// Wait for the latest request to settle
    ///
    /// Returns `None` if it was cancelled or nothing was issued.
    pub async fn wait(&self) -> Option<T> {
        let mut rx = self.subscribe();
        loop {
            match &*rx.borrow_and_update() {
                RequestState::Ready { value, .. } => return Some(value.clone()),
                RequestState::Idle | RequestState::Cancelled => return None,
                RequestState::Pending { .. } => {}
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }
}

impl<T> Default for LatestRequest<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LatestRequest<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
