//! Rate limiting for controlling call rates
//!
//! This module provides a decorating rate limiter that bounds how many
//! successful invocations of an operation happen within a sliding time
//! window, either by suspending callers or by diverting to a fallback.

pub mod rate_limit;

pub use rate_limit::RateLimit;
