//! Owned recurring background tasks
//!
//! Provides a periodic callback runner whose lifetime is tied to an explicit
//! handle: cancelling the handle stops the callback, and dropping it aborts
//! the task outright, so no background work survives the owner on any exit
//! path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Handle owning a recurring background task started by [`recurring`].
///
/// The task stops when [`cancel`](TickerHandle::cancel) is called or when the
/// handle is dropped. There is no process-wide scheduler and no exit hook;
/// whoever holds the handle owns the task.
#[derive(Debug)]
pub struct TickerHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Stop the recurring task.
    ///
    /// Idempotent; safe to call from any task.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }

    /// Check if the task has been stopped
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Spawn a task that invokes `callback` every `period`.
///
/// The first invocation happens one full period after the call, not
/// immediately. `period` must be nonzero, and the call must happen from
/// within a tokio runtime.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use breakwater_patterns::time::recurring;
///
/// # tokio_test::block_on(async {
/// let ticks = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&ticks);
///
/// let handle = recurring(Duration::from_millis(10), move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// tokio::time::sleep(Duration::from_millis(35)).await;
/// handle.cancel();
/// # });
/// ```
pub fn recurring<F>(period: Duration, mut callback: F) -> TickerHandle
where
    F: FnMut() + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // Skip first immediate tick

        loop {
            interval.tick().await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
            callback();
        }
        debug!("recurring task stopped after cancellation");
    });

    TickerHandle { cancelled, task }
}
