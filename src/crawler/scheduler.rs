//! Scheduler for bounded-concurrency link checks
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Delayed tasks for retries and host back-off
//! - Idle detection once every queued and running task has finished
//!
//! A delayed task does not hold a permit while it waits, so a long
//! `retry-after` never starves the rest of the crawl.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio::time::Instant;

/// A unit of work accepted by the scheduler
pub type CrawlTask = BoxFuture<'static, ()>;

/// Runs tasks with at most `concurrency` in flight
///
/// Cloning is cheap; every clone feeds the same queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    /// Global semaphore for limiting concurrent tasks
    semaphore: Arc<Semaphore>,

    concurrency: usize,

    /// Tasks queued, delayed or running
    outstanding: AtomicUsize,

    /// Tasks currently holding a permit
    in_flight: AtomicUsize,

    peak_in_flight: AtomicUsize,

    idle: Notify,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `concurrency` - Maximum tasks running at once (values below 1 become 1)
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);

        Self {
            inner: Arc::new(SchedulerInner {
                semaphore: Arc::new(Semaphore::new(concurrency)),
                concurrency,
                outstanding: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Queues a task to start no earlier than `delay` from now
    ///
    /// Tasks whose delays have elapsed start in the order their delays
    /// elapsed, subject to the concurrency limit. Must be called from within
    /// a Tokio runtime.
    pub fn add(&self, task: CrawlTask, delay: Duration) {
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let now = Instant::now();
        let ready_at = now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE);

        tokio::spawn(async move {
            let _outstanding = OutstandingGuard(Arc::clone(&inner));

            if !delay.is_zero() {
                tokio::time::sleep_until(ready_at).await;
            }

            let Ok(_permit) = Arc::clone(&inner.semaphore).acquire_owned().await else {
                tracing::warn!("Scheduler semaphore closed, dropping task");
                return;
            };

            let running = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            inner.peak_in_flight.fetch_max(running, Ordering::SeqCst);
            let _in_flight = InFlightGuard(Arc::clone(&inner));

            if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
                tracing::error!("Scheduled task panicked: {}", panic_message(&*panic));
            }
        });
    }

    /// Waits until no task is queued, delayed or running
    ///
    /// Returns immediately if nothing was ever added.
    pub async fn on_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Returns the number of tasks not yet finished
    pub fn pending(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    /// Returns the number of tasks currently running
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Returns the highest number of tasks ever running at once
    pub fn peak_in_flight(&self) -> usize {
        self.inner.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Returns the concurrency limit
    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("concurrency", &self.concurrency())
            .field("pending", &self.pending())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Cap for delays too large to represent as an instant
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Extracts the message of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Decrements the outstanding count even if the task panics
struct OutstandingGuard(Arc<SchedulerInner>);

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        if self.0.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            tracing::trace!("Scheduler idle");
            self.0.idle.notify_waiters();
        }
    }
}

struct InFlightGuard(Arc<SchedulerInner>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
