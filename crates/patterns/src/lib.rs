//! Composable resilience patterns for fault-tolerant systems.
//!
//! This crate provides three independent primitives, each wrapping an
//! arbitrary zero-argument fallible operation:
//!
//! - **[`Retryable`]**: re-invokes an operation until it succeeds or an
//!   attempt budget is exhausted, with configurable delay, first/last failure
//!   selection, and an early-exit circuit breaker predicate
//! - **[`RateLimit`]**: bounds successful invocations per sliding time
//!   window, either blocking callers until capacity frees up or diverting to
//!   a fallback operation
//! - **[`Poller`]**: repeatedly invokes a producer on a cooperative loop,
//!   adaptively shrinking or growing its inter-poll delay based on whether
//!   the last poll yielded data
//!
//! The primitives do not compose automatically; rate-limited retries, for
//! example, are built by nesting one inside the other at the call site.
//!
//! All waiting is async (tokio): "blocking" a caller means suspending its
//! task, never a thread. Cancellation is cooperative through [`CancelHandle`]
//! and ends in-flight waits promptly.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod error;
pub mod limits;
pub mod polling;
pub mod resilience;
pub mod testing;
pub mod time;

// Re-export commonly used types for convenience
// ------------------------------
pub use error::{ConfigError, ConfigResult};
pub use limits::RateLimit;
pub use polling::{value_changed, Poller};
pub use resilience::{RetryError, Retryable};
pub use time::{recurring, CancelHandle, TickerHandle};
