//! FIFO queue of pending upstream work items.
//!
//! Each item pairs a deferred work function with the oneshot sender that
//! resolves the submitter's completion handle. An item is owned exclusively
//! by the queue until the worker dequeues it, and by the worker thereafter
//! until it resolves or rejects the handle exactly once.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::{ThrottleError, UpstreamError};

/// Boxed future produced by a work function.
pub(crate) type WorkFuture<T> = Pin<Box<dyn Future<Output = Result<T, UpstreamError>> + Send>>;

/// Deferred work function, invoked at most once by the worker.
pub(crate) type WorkFn<T> = Box<dyn FnOnce() -> WorkFuture<T> + Send>;

/// A queued unit of upstream work.
pub(crate) struct QueueItem<T> {
    /// The deferred upstream call
    pub(crate) work: WorkFn<T>,

    /// Human-readable request description for worker logs
    pub(crate) context: String,

    /// When the item was enqueued
    pub(crate) created_at: Instant,

    /// Resolves the submitter's completion handle
    pub(crate) completion: oneshot::Sender<Result<T, ThrottleError>>,
}

/// Ordered holding area for pending work items.
///
/// Items are dequeued strictly FIFO. The only exception is
/// [`RequestQueue::push_front`], used by the worker to return an item whose
/// turn arrived while the operating window was closed, preserving its
/// position at the head.
pub(crate) struct RequestQueue<T> {
    items: Mutex<VecDeque<QueueItem<T>>>,
}

impl<T> RequestQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueueItem<T>>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push_back(&self, item: QueueItem<T>) {
        self.lock().push_back(item);
    }

    /// Return an item to the head of the queue, preserving its position.
    pub(crate) fn push_front(&self, item: QueueItem<T>) {
        self.lock().push_front(item);
    }

    pub(crate) fn pop_front(&self) -> Option<QueueItem<T>> {
        self.lock().pop_front()
    }

    /// Remove and return every pending item.
    pub(crate) fn drain(&self) -> Vec<QueueItem<T>> {
        self.lock().drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
