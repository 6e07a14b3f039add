//! Quota-gated admission and pacing for upstream requests.
//!
//! One [`Throttler`] instance fronts one metered upstream service. Work is
//! submitted as deferred functions and executed by a single worker loop that
//! enforces three gates, in order:
//!
//! 1. the operating window - nothing is dequeued while the window is closed;
//! 2. the daily quota - a hard stop: once the counter reaches the quota,
//!    every queued item is rejected with `RateLimitExceeded`;
//! 3. the pacing interval - consecutive upstream calls are spread evenly
//!    across the operating window so the quota lasts the whole day.
//!
//! At most one worker runs per instance (guarded by `is_processing`), so at
//! most one upstream call per instance is ever in flight. Distinct upstream
//! services get their own instances with independent queues and counters.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::{ThrottleError, UpstreamError};

use super::queue::{QueueItem, RequestQueue};
use super::window::{now_local, BusinessHoursWindow};

/// Upper bound on a single window-closed sleep, so the worker re-reads the
/// wall clock regularly instead of committing to one long wait.
const MAX_CLOSED_WAIT: Duration = Duration::from_secs(30 * 60);

/// The daily counter resets once this much time has elapsed since the last
/// reset (elapsed-time semantics, not calendar-aligned).
const DAILY_RESET_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// Status Snapshots
// =============================================================================

/// Point-in-time view of a throttler, for status/monitoring display.
#[derive(Debug, Clone, Serialize)]
pub struct ThrottleStatus {
    /// Service label this throttler fronts
    pub service: String,

    /// Upstream calls performed since the last daily reset
    pub daily_count: u32,

    /// Daily ceiling
    pub quota_per_day: u32,

    /// Calls left before the ceiling
    pub remaining: u32,

    /// Items currently waiting in the queue
    pub queue_length: usize,

    /// Whether the worker loop is currently running
    pub is_processing: bool,

    /// Operating-window view
    pub window: WindowStatus,
}

/// Operating-window portion of a status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct WindowStatus {
    /// "HH:MM-HH:MM" display string
    pub formatted: String,

    /// Window length in hours
    pub operating_hours: f64,

    /// Whether the window is open right now
    pub currently_open: bool,

    /// Seconds until the next start instant (0 while open)
    pub next_open_in_secs: u64,
}

// =============================================================================
// Throttler
// =============================================================================

struct PaceState {
    daily_count: u32,
    last_reset: Instant,
    last_request: Option<Instant>,
    is_processing: bool,
}

struct Inner<T> {
    name: String,
    quota_per_day: u32,
    pace: Duration,
    window: BusinessHoursWindow,
    queue: RequestQueue<T>,
    state: Mutex<PaceState>,
}

/// Admission controller for one metered upstream service.
///
/// Cheap to clone; clones share the same queue and counters.
///
/// # Example
///
/// ```ignore
/// use tilegate::throttle::{BusinessHoursWindow, Throttler};
///
/// let window = BusinessHoursWindow::new(6, 0, 0, 15);
/// let throttler: Throttler<Vec<u8>> = Throttler::new("tiles", 50_000, window);
///
/// let payload = throttler
///     .submit(|| async { fetch_from_upstream().await }, "tile 12/2200/1343")
///     .await?;
/// ```
pub struct Throttler<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Throttler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Throttler<T> {
    /// Create a throttler for the given daily quota and operating window.
    ///
    /// The pacing interval is derived as
    /// `operating_hours * 3_600_000 ms / quota_per_day`.
    ///
    /// # Panics
    ///
    /// Panics if `quota_per_day` is zero or the window has zero length;
    /// [`crate::config::Config::validate`] rejects both before services are
    /// constructed.
    pub fn new(name: impl Into<String>, quota_per_day: u32, window: BusinessHoursWindow) -> Self {
        assert!(quota_per_day > 0, "quota_per_day must be non-zero");
        let hours = window.operating_hours();
        assert!(hours > 0.0, "operating window must have non-zero length");

        let pace = Duration::from_secs_f64(hours * 3600.0 / quota_per_day as f64);

        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                quota_per_day,
                pace,
                window,
                queue: RequestQueue::new(),
                state: Mutex::new(PaceState {
                    daily_count: 0,
                    last_reset: Instant::now(),
                    last_request: None,
                    is_processing: false,
                }),
            }),
        }
    }

    /// Submit work and await its completion handle.
    ///
    /// The work function is executed by the worker once the operating window,
    /// quota, and pacing gates allow it. `context` is a short request
    /// description used in worker logs.
    ///
    /// # Errors
    ///
    /// - [`ThrottleError::RateLimitExceeded`] - the daily quota was reached
    ///   before this item's turn; all queued items fail the same way.
    /// - [`ThrottleError::Upstream`] - this item's work function failed.
    /// - [`ThrottleError::Cancelled`] - the item was dropped unexecuted.
    pub async fn submit<F, Fut>(
        &self,
        work: F,
        context: impl Into<String>,
    ) -> Result<T, ThrottleError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, UpstreamError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.inner.queue.push_back(QueueItem {
            work: Box::new(move || Box::pin(work())),
            context: context.into(),
            created_at: Instant::now(),
            completion: tx,
        });
        self.ensure_worker().await;

        match rx.await {
            Ok(result) => result,
            // The worker dropped the sender without resolving (shutdown).
            Err(_) => Err(ThrottleError::Cancelled),
        }
    }

    /// Spawn the worker loop unless one is already running.
    async fn ensure_worker(&self) {
        let mut state = self.inner.state.lock().await;
        if state.is_processing {
            return;
        }
        state.is_processing = true;
        drop(state);

        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_worker(inner));
    }

    /// Snapshot the current quota, queue, and window state.
    pub async fn status(&self) -> ThrottleStatus {
        let state = self.inner.state.lock().await;
        let now = now_local();
        let currently_open = self.inner.window.is_open(now);

        ThrottleStatus {
            service: self.inner.name.clone(),
            daily_count: state.daily_count,
            quota_per_day: self.inner.quota_per_day,
            remaining: self.inner.quota_per_day.saturating_sub(state.daily_count),
            queue_length: self.inner.queue.len(),
            is_processing: state.is_processing,
            window: WindowStatus {
                formatted: self.inner.window.formatted(),
                operating_hours: self.inner.window.operating_hours(),
                currently_open,
                next_open_in_secs: if currently_open {
                    0
                } else {
                    self.inner.window.until_open(now).as_secs()
                },
            },
        }
    }

    /// The minimum interval between consecutive upstream calls.
    pub fn pace(&self) -> Duration {
        self.inner.pace
    }

    /// The configured operating window.
    pub fn window(&self) -> &BusinessHoursWindow {
        &self.inner.window
    }
}

// =============================================================================
// Worker Loop
// =============================================================================

async fn run_worker<T: Send + 'static>(inner: Arc<Inner<T>>) {
    loop {
        // Stop when the queue is drained. The emptiness re-check happens
        // under the state lock, so a submit racing with shutdown either sees
        // is_processing cleared and spawns a fresh worker, or its item is
        // seen here and the loop keeps going.
        {
            let mut state = inner.state.lock().await;
            if inner.queue.is_empty() {
                state.is_processing = false;
                break;
            }
        }

        // Gate 1: the operating window. Nothing is dequeued while closed.
        let now = now_local();
        if !inner.window.is_open(now) {
            let wait = inner.window.until_open(now).min(MAX_CLOSED_WAIT);
            debug!(
                service = %inner.name,
                wait_secs = wait.as_secs(),
                queued = inner.queue.len(),
                "operating window closed, waiting"
            );
            sleep(wait).await;
            continue;
        }

        // Daily reset, then gate 2: the quota ceiling.
        {
            let mut state = inner.state.lock().await;
            if state.last_reset.elapsed() >= DAILY_RESET_INTERVAL {
                info!(
                    service = %inner.name,
                    previous = state.daily_count,
                    "resetting daily quota counter"
                );
                state.daily_count = 0;
                state.last_reset = Instant::now();
            }

            if state.daily_count >= inner.quota_per_day {
                drop(state);
                let pending = inner.queue.drain();
                warn!(
                    service = %inner.name,
                    rejected = pending.len(),
                    quota = inner.quota_per_day,
                    "daily quota exhausted, rejecting queued requests"
                );
                for item in pending {
                    let _ = item.completion.send(Err(ThrottleError::RateLimitExceeded {
                        quota: inner.quota_per_day,
                    }));
                }
                continue;
            }
        }

        let Some(item) = inner.queue.pop_front() else {
            continue;
        };

        // Gate 3: pacing. Keep at least `pace` between consecutive calls.
        let wait = {
            let state = inner.state.lock().await;
            match state.last_request {
                Some(last) => inner.pace.saturating_sub(last.elapsed()),
                None => Duration::ZERO,
            }
        };
        if !wait.is_zero() {
            sleep(wait).await;
        }

        // The window may have closed during the pacing sleep. Put the item
        // back at the head so its position is preserved, rather than
        // executing late.
        if !inner.window.is_open(now_local()) {
            inner.queue.push_front(item);
            continue;
        }

        match (item.work)().await {
            Ok(value) => {
                let mut state = inner.state.lock().await;
                state.daily_count += 1;
                state.last_request = Some(Instant::now());
                let used = state.daily_count;
                drop(state);
                debug!(
                    service = %inner.name,
                    context = %item.context,
                    used,
                    quota = inner.quota_per_day,
                    queued_ms = item.created_at.elapsed().as_millis() as u64,
                    "upstream request completed"
                );
                let _ = item.completion.send(Ok(value));
            }
            Err(err) => {
                warn!(
                    service = %inner.name,
                    context = %item.context,
                    error = %err,
                    "upstream request failed"
                );
                let _ = item.completion.send(Err(ThrottleError::Upstream(err)));
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
