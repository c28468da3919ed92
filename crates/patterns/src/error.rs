//! Configuration error types shared by all patterns.
//!
//! Invalid construction arguments are rejected here, at configuration time.
//! Runtime failures of wrapped operations never surface as [`ConfigError`];
//! they keep their own types (see [`crate::resilience::RetryError`]).

use thiserror::Error;

/// Simple configuration error for validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A construction or fluent-update argument was rejected
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// What was wrong with the argument
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;
