//! Resilience patterns for fault tolerance
//!
//! This module provides the retry executor: a configurable, immutable policy
//! that re-invokes a fallible operation until it succeeds, its attempt budget
//! runs out, or a circuit-breaker predicate aborts the sequence.

pub mod retry;

pub use retry::{RetryError, Retryable};
