//! Dynamic poller with adaptive inter-poll delay
//!
//! The poller calls a producer in a loop and hands every yielded value to a
//! consumer. When a poll yields data the wait shrinks back to `min` (there
//! could be more to process); when it yields nothing the wait steps up to
//! `max`. Zero is valid for both bounds.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::time::CancelHandle;

/// Dynamic poller that expands and contracts its waiting time between the
/// configured `min` and `max`.
///
/// The loop has no natural end: it runs until the [`CancelHandle`] obtained
/// from [`handle`](Poller::handle) is cancelled, and reacts to cancellation
/// both between iterations and during the inter-poll wait. The poller never
/// spawns anything itself; hand [`run`](Poller::run) to a task of your own.
///
/// Configuration is by value, as with [`crate::Retryable`]: each fluent
/// method consumes the poller and returns a new one.
///
/// # Examples
///
/// ```rust
/// use breakwater_patterns::{testing, Poller};
///
/// # tokio_test::block_on(async {
/// let poller = Poller::of(testing::limited_supply(3), |value: u64| {
///     tracing::info!("polled value {}", value);
/// });
/// let handle = poller.handle();
///
/// let loop_task = tokio::spawn(poller.run());
/// handle.cancel();
/// loop_task.await.unwrap();
/// # });
/// ```
pub struct Poller<P, C> {
    min: Duration,
    max: Duration,
    producer: P,
    consumer: C,
    current_delay: Duration,
    cancel: CancelHandle,
}

impl<P, C> Poller<P, C> {
    /// Create a poller over `producer` and `consumer` with both wait bounds
    /// at zero
    pub fn of(producer: P, consumer: C) -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
            producer,
            consumer,
            current_delay: Duration::ZERO,
            cancel: CancelHandle::new(),
        }
    }

    /// Set the minimum wait, used after every poll that yields a value
    pub fn min(mut self, min: Duration) -> Self {
        self.min = min;
        self
    }

    /// Set the maximum wait, used after every poll that comes up empty.
    ///
    /// Rejects a maximum below the currently configured minimum.
    pub fn max(mut self, max: Duration) -> ConfigResult<Self> {
        if max < self.min {
            return Err(ConfigError::invalid("max cannot be less than min"));
        }
        self.max = max;
        Ok(self)
    }

    /// Get a handle that stops the loop from another task
    pub fn handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run the poll loop until cancelled.
    ///
    /// Every yielded value is dispatched to the consumer synchronously,
    /// before the next delay is computed. A panicking consumer propagates
    /// and ends the loop.
    pub async fn run<T>(mut self)
    where
        P: FnMut() -> Option<T>,
        C: FnMut(T),
    {
        debug!("poller starting (min {:?}, max {:?})", self.min, self.max);
        self.current_delay = self.min;

        while !self.cancel.is_cancelled() {
            match (self.producer)() {
                Some(value) => {
                    (self.consumer)(value);
                    // Data arrived, so there may be more right behind it.
                    self.current_delay = self.min;
                }
                None => {
                    self.current_delay = self.max;
                }
            }
            self.wait_poll_interval().await;
        }

        debug!("poller stopped after cancellation");
    }

    async fn wait_poll_interval(&self) {
        if self.current_delay.is_zero() {
            // Keep the loop cooperative so cancellation and other tasks get
            // a turn even with no wait configured.
            tokio::task::yield_now().await;
            return;
        }
        tokio::select! {
            _ = sleep(self.current_delay) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_max_below_min_rejected() {
        let result = Poller::of(testing::limited_supply(5), |_: u64| {})
            .min(Duration::from_millis(10))
            .max(Duration::from_millis(9));
        assert!(result.is_err());

        let ok = Poller::of(testing::limited_supply(5), |_: u64| {})
            .min(Duration::from_millis(10))
            .max(Duration::from_millis(10));
        assert!(ok.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_poller_consumes_whole_supply() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let poller = Poller::of(testing::limited_supply(5), move |value| {
            sink.lock().unwrap().push(value);
        });
        let handle = poller.handle();
        let loop_task = tokio::spawn(poller.run());

        // With zero bounds the supply drains almost immediately; poll until
        // it has.
        for _ in 0..200 {
            if seen.lock().unwrap().len() >= 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        handle.cancel();
        loop_task.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_resets_on_data_and_steps_up_when_empty() {
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&stamps);

        let mut supply =
            testing::rotating_supply(vec![Some(1u64), Some(2), None, None]);
        let producer = move || {
            recorder.lock().unwrap().push(tokio::time::Instant::now());
            supply()
        };

        let poller = Poller::of(producer, |_| {})
            .min(Duration::from_millis(10))
            .max(Duration::from_millis(100))
            .unwrap();
        let handle = poller.handle();
        let loop_task = tokio::spawn(poller.run());

        tokio::time::sleep(Duration::from_millis(400)).await;
        handle.cancel();
        loop_task.await.unwrap();

        let stamps = stamps.lock().unwrap();
        assert!(stamps.len() >= 4, "expected at least 4 polls, got {}", stamps.len());
        // Polls that yielded data are followed by the min gap, empty polls
        // by the max gap.
        assert_eq!(stamps[1] - stamps[0], Duration::from_millis(10));
        assert_eq!(stamps[2] - stamps[1], Duration::from_millis(10));
        assert_eq!(stamps[3] - stamps[2], Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_the_wait() {
        let poller = Poller::of(testing::limited_supply(1), |_: u64| {})
            .min(Duration::from_secs(60))
            .max(Duration::from_secs(60))
            .unwrap();
        let handle = poller.handle();
        let loop_task = tokio::spawn(poller.run());

        // Let the loop poll once and park on its 60s wait, then cancel; the
        // test only completes if the wait ends promptly.
        tokio::time::sleep(Duration::from_millis(1)).await;
        handle.cancel();
        loop_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_before_run_exits_immediately() {
        let poller = Poller::of(testing::limited_supply(5), |_: u64| {});
        let handle = poller.handle();
        handle.cancel();
        // Runs on this task; returns because the flag is already set.
        poller.run().await;
    }
}
