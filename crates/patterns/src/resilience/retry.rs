//! Retry executor with circuit breaking and failure selection
//!
//! [`Retryable`] attempts the same operation in a sequence for as long as it
//! keeps failing. Configuration is an immutable value: every fluent method
//! consumes the policy and returns a new one, so a cloned base policy can be
//! specialized without aliasing hazards, and one policy value can be invoked
//! concurrently from any number of tasks with fully independent bookkeeping.
//!
//! The operation's `Err` type is the retryable failure category. Failures
//! outside that contract (panics) are not caught and propagate to the caller
//! unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::time::CancelHandle;

const DEFAULT_ATTEMPTS: u32 = 5;

/// Predicate deciding whether a failure must break the retry circuit
type BreakerFn<E> = dyn Fn(&E) -> bool + Send + Sync;

/// Errors surfaced by [`Retryable::retry`]
///
/// Every variant that stems from the wrapped operation carries the original
/// failure as a typed `source`, so callers can pattern-match on cause.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The attempt budget ran out; `source` is the first or last failure
    /// seen, per policy
    #[error("operation failed after {attempts} attempt/s")]
    Exhausted {
        /// How many attempts were made
        attempts: u32,
        /// The selected failure
        source: E,
    },

    /// The circuit breaker classified a failure as fatal; retrying stopped
    /// immediately and exactly that failure is carried here, regardless of
    /// the first/last selection policy
    #[error("circuit broken on attempt {attempt}")]
    CircuitBroken {
        /// The attempt whose failure tripped the breaker
        attempt: u32,
        /// The failure that tripped the breaker
        source: E,
    },

    /// The wait between attempts was cancelled from outside.
    ///
    /// Carries the most recently recorded failure so it is not swallowed;
    /// the variant itself is the cancellation signal, distinguishable from
    /// both exhaustion and breaker trips.
    #[error("retry interrupted while waiting between attempts")]
    Interrupted {
        /// The last failure recorded before cancellation, if any
        last_failure: Option<E>,
    },

    /// The attempt budget ran out without any failure being recorded.
    ///
    /// This cannot happen when the operation honors its contract; it signals
    /// a bug rather than an ordinary operation failure.
    #[error("operation failed without surfacing any failure")]
    NoFailureCaptured,
}

impl<E> RetryError<E> {
    /// Get the underlying operation failure, if one was carried
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } | Self::CircuitBroken { source, .. } => Some(source),
            Self::Interrupted { last_failure } => last_failure,
            Self::NoFailureCaptured => None,
        }
    }

    /// Check if this represents an externally requested cancellation
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

/// Attempt the same operation in a sequence as long as it keeps failing.
///
/// Defaults: 5 attempts, no delay between them, and the *last* caught
/// failure is the one surfaced when the budget runs out. All of it is
/// reconfigurable through the fluent methods, each of which returns a new
/// policy value.
///
/// A circuit breaker can also be supplied: a predicate that, given a
/// failure, returns true when that failure must stop the sequence and be
/// surfaced immediately, bypassing the remaining attempts.
///
/// No task is spawned by this type; `retry()` runs entirely on the caller.
///
/// # Examples
///
/// ```rust
/// use breakwater_patterns::Retryable;
///
/// # tokio_test::block_on(async {
/// let answer = Retryable::of(|| async { Ok::<_, String>(42) })
///     .named("answer")
///     .retry()
///     .await
///     .unwrap();
/// assert_eq!(answer, 42);
/// # });
/// ```
pub struct Retryable<F, E> {
    name: String,
    operation: F,
    max_attempts: u32,
    delay: Duration,
    throw_first: bool,
    circuit_breaker: Option<Arc<BreakerFn<E>>>,
    cancel: CancelHandle,
}

impl<F, E> Retryable<F, E> {
    /// Wrap `operation` in a policy with the default configuration
    pub fn of(operation: F) -> Self {
        Self {
            name: "retryable".to_string(),
            operation,
            max_attempts: DEFAULT_ATTEMPTS,
            delay: Duration::ZERO,
            throw_first: false,
            circuit_breaker: None,
            cancel: CancelHandle::new(),
        }
    }

    /// Give a name to the operation; it only shows up in log lines
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the number of attempts, including the first one.
    ///
    /// Rejects zero: an operation must be tried at least once.
    pub fn times(mut self, max_attempts: u32) -> ConfigResult<Self> {
        if max_attempts == 0 {
            return Err(ConfigError::invalid(
                "max_attempts must be greater than 0; an operation is tried at least once",
            ));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    /// Set the wait between attempts.
    ///
    /// The first try still goes immediately, and nothing is waited after the
    /// final one.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Surface the *first* caught failure when the budget runs out
    pub fn throw_first(mut self) -> Self {
        self.throw_first = true;
        self
    }

    /// Surface the *last* caught failure when the budget runs out (default)
    pub fn throw_last(mut self) -> Self {
        self.throw_first = false;
        self
    }

    /// Apply a circuit breaker.
    ///
    /// When the predicate returns true for a failure, the sequence stops and
    /// that exact failure is surfaced as [`RetryError::CircuitBroken`].
    pub fn circuit_breaker<B>(mut self, breaker: B) -> Self
    where
        B: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.circuit_breaker = Some(Arc::new(breaker));
        self
    }

    /// Get a handle that cancels the wait between attempts of this policy
    /// value from another task
    pub fn handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The configured diagnostic name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F, E> Retryable<F, E>
where
    E: fmt::Display,
{
    /// Retry the operation until it succeeds or the attempt budget runs out.
    ///
    /// Attempts are strictly sequential within one call. Failure bookkeeping
    /// lives on this call's stack, so concurrent `retry()` invocations of
    /// the same policy value never observe each other.
    pub async fn retry<T, Fut>(&self) -> Result<T, RetryError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut caught: Option<E> = None;
        let mut first_failure = true;

        for attempt in 1..=self.max_attempts {
            match (self.operation)().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("operation \"{}\" succeeded on attempt {}", self.name, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    warn!(
                        "operation \"{}\" was attempted {} time/s, but fails with: \"{}\"",
                        self.name, attempt, error
                    );

                    if let Some(breaker) = &self.circuit_breaker {
                        if breaker(&error) {
                            debug!("circuit broken for \"{}\", stopping retries", self.name);
                            return Err(RetryError::CircuitBroken { attempt, source: error });
                        }
                    }

                    if !self.throw_first || first_failure {
                        caught = Some(error);
                    }
                    first_failure = false;
                }
            }

            if attempt < self.max_attempts && !self.wait_for_retry().await {
                return Err(RetryError::Interrupted { last_failure: caught });
            }
        }

        // All attempts failed, surface whatever we recorded.
        match caught {
            Some(source) => Err(RetryError::Exhausted { attempts: self.max_attempts, source }),
            None => Err(RetryError::NoFailureCaptured),
        }
    }

    /// Alias for [`retry`](Retryable::retry), for call sites that treat the
    /// policy as a plain callable
    pub async fn get<T, Fut>(&self) -> Result<T, RetryError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retry().await
    }

    /// Returns false when the wait was cancelled
    async fn wait_for_retry(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if self.delay.is_zero() {
            return true;
        }

        debug!("waiting {:?} to retry operation \"{}\"", self.delay, self.name);
        tokio::select! {
            _ = sleep(self.delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}

impl<F: Clone, E> Clone for Retryable<F, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            operation: self.operation.clone(),
            max_attempts: self.max_attempts,
            delay: self.delay,
            throw_first: self.throw_first,
            circuit_breaker: self.circuit_breaker.clone(),
            // Derived policies cancel independently of their base.
            cancel: CancelHandle::new(),
        }
    }
}

impl<F, E> fmt::Debug for Retryable<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retryable")
            .field("name", &self.name)
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .field("throw_first", &self.throw_first)
            .field("circuit_breaker", &self.circuit_breaker.is_some())
            .finish()
    }
}
