//! Cooperative cancellation
//!
//! Provides a clonable handle that flags cancellation and wakes any task
//! currently suspended on a cancellable wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A handle used to cancel a cooperative wait or loop.
///
/// Cloning shares the underlying flag, so a handle can be kept on one task
/// while the loop it controls runs on another. Cancellation is one-way: once
/// cancelled, a handle stays cancelled.
///
/// # Examples
///
/// ```rust
/// use breakwater_patterns::CancelHandle;
///
/// let handle = CancelHandle::new();
/// assert!(!handle.is_cancelled());
///
/// handle.cancel();
/// assert!(handle.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelHandle {
    /// Create a new, not-yet-cancelled handle
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), notify: Arc::new(Notify::new()) }
    }

    /// Flag cancellation and wake every task suspended on this handle
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Check whether the handle has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Suspend until the handle is cancelled.
    ///
    /// Completes immediately if cancellation already happened.
    pub(crate) async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before the final flag check so a cancel() between the
            // check and the await cannot be missed.
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
