//! Sliding-window rate limiter
//!
//! Limits the rate at which a function is called, in one of two ways:
//!
//! - **blocking**: suspend callers while the limit is reached, letting them
//!   proceed as capacity frees up
//! - **failing**: invoke a fallback operation while the limit is reached
//!   (return a default, signal back pressure, raise the caller's own error)
//!
//! Only invocations that return `Ok` count against the limit; failures
//! propagate uncounted. The window is decayed rather than reset: a
//! background tick subtracts `max_calls` from the counter (floored at zero)
//! every window, which slides capacity back gradually instead of all at
//! once. The counter's read-then-act sequences are deliberately not
//! serialized against each other, so a burst racing the tick can be admitted
//! slightly above the limit; the tolerance is intentional and buys uncontended
//! atomics instead of a lock.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::time::{recurring, TickerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Blocking,
    Failing,
}

/// Decorates an operation with a calls-per-window limit.
///
/// Each limiter owns a background tick task that decays its counter every
/// window. The task stops when [`shutdown`](RateLimit::shutdown) is called or
/// when the limiter is dropped, whichever comes first; nothing outlives the
/// limiter value. Constructors must therefore run inside a tokio runtime.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use breakwater_patterns::RateLimit;
///
/// # tokio_test::block_on(async {
/// let limiter = RateLimit::as_failing(
///     1,
///     Duration::from_millis(100),
///     || async { Ok::<_, String>("limited") },
///     || async { Ok("fresh") },
/// )
/// .unwrap();
///
/// assert_eq!(limiter.get().await.unwrap(), "fresh");
/// // Capacity for this window is spent; the fallback answers instead.
/// assert_eq!(limiter.get().await.unwrap(), "limited");
/// # });
/// ```
pub struct RateLimit<F, G = F> {
    mode: Mode,
    max_calls: u64,
    window: Duration,
    operation: F,
    fallback: Option<G>,
    count: Arc<AtomicU64>,
    window_tick: Arc<Notify>,
    ticker: TickerHandle,
}

impl<F> RateLimit<F, F> {
    /// Create a limiter that suspends callers while the limit is reached.
    ///
    /// Never fails the caller with a limit error; it only delays.
    pub fn as_blocking(max_calls: u64, window: Duration, operation: F) -> ConfigResult<Self> {
        Self::new(Mode::Blocking, max_calls, window, operation, None)
    }
}

impl<F, G> RateLimit<F, G> {
    /// Create a limiter that invokes `fallback` while the limit is reached.
    ///
    /// The fallback's outcome silently substitutes the operation's; the
    /// limiter itself never raises a "limit exceeded" error.
    pub fn as_failing(
        max_calls: u64,
        window: Duration,
        fallback: G,
        operation: F,
    ) -> ConfigResult<Self> {
        Self::new(Mode::Failing, max_calls, window, operation, Some(fallback))
    }

    fn new(
        mode: Mode,
        max_calls: u64,
        window: Duration,
        operation: F,
        fallback: Option<G>,
    ) -> ConfigResult<Self> {
        if max_calls == 0 {
            return Err(ConfigError::invalid("max_calls must be greater than 0"));
        }
        if window.is_zero() {
            return Err(ConfigError::invalid("window must be greater than zero"));
        }

        let count = Arc::new(AtomicU64::new(0));
        let window_tick = Arc::new(Notify::new());

        // Decay the counter once per window and wake blocked callers. The
        // subtraction slides the window instead of resetting it, restoring
        // capacity in proportion to elapsed windows.
        let decayed = Arc::clone(&count);
        let tick = Arc::clone(&window_tick);
        let ticker = recurring(window, move || {
            let _ = decayed
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                    Some(current.saturating_sub(max_calls))
                });
            debug!("rate limit window elapsed, capacity decayed");
            tick.notify_waiters();
        });

        Ok(Self { mode, max_calls, window, operation, fallback, count, window_tick, ticker })
    }

    /// Invoke the decorated operation, honoring the limit.
    ///
    /// Outcomes are exactly the wrapped operations' own: the limiter adds no
    /// error type. A failing (`Err`) invocation of the main operation does
    /// not consume capacity.
    pub async fn get<T, E, FutF, FutG>(&self) -> Result<T, E>
    where
        F: Fn() -> FutF,
        FutF: Future<Output = Result<T, E>>,
        G: Fn() -> FutG,
        FutG: Future<Output = Result<T, E>>,
    {
        if self.mode == Mode::Failing && self.count.load(Ordering::Acquire) >= self.max_calls {
            if let Some(fallback) = &self.fallback {
                debug!("rate limit reached, diverting to fallback");
                return fallback().await;
            }
        }

        if self.mode == Mode::Blocking {
            self.wait_for_capacity().await;
        }

        let value = (self.operation)().await?;
        self.count.fetch_add(1, Ordering::AcqRel);
        Ok(value)
    }

    /// The number of counted calls in the current window
    pub fn current_count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Stop the background window tick.
    ///
    /// After shutdown the counter no longer decays, so a saturated failing
    /// limiter stays saturated and a blocking one delays indefinitely. Also
    /// happens automatically when the limiter is dropped.
    pub fn shutdown(&self) {
        self.ticker.cancel();
    }

    /// Suspend until the counter drops below the limit.
    ///
    /// Waits on the tick's notification, with a sleep of a tenth of the
    /// window bounding each round so a missed wake-up costs at most that.
    async fn wait_for_capacity(&self) {
        let granularity = (self.window / 10).max(Duration::from_millis(1));
        while self.count.load(Ordering::Acquire) >= self.max_calls {
            let tick = self.window_tick.notified();
            tokio::pin!(tick);
            tick.as_mut().enable();
            if self.count.load(Ordering::Acquire) < self.max_calls {
                break;
            }
            tokio::select! {
                _ = &mut tick => {}
                _ = sleep(granularity) => {}
            }
        }
    }
}
