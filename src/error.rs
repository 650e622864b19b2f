use thiserror::Error;

use crate::client::FetchError;
use crate::polling::PollError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Polling failed: {0}")]
    Polling(#[from] PollError),

    #[error("Transport error: {0}")]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected construction parameters, for either side of the wire.
///
/// Raised before any I/O happens: a config that fails here never reaches the
/// server loop or the polling loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial_delay must be a finite value > 0 (got {0})")]
    InitialDelay(f64),

    #[error("max_delay ({max_delay}) must be finite and >= initial_delay ({initial_delay})")]
    MaxDelay { initial_delay: f64, max_delay: f64 },

    #[error("backoff_factor must be a finite value >= 1.0 (got {0})")]
    BackoffFactor(f64),

    #[error("timeout must be a finite value > 0 (got {0})")]
    Timeout(f64),

    #[error("max_attempts must be at least 1")]
    MaxAttempts,

    #[error("completion_time must be a finite value >= 0 (got {0})")]
    CompletionTime(f64),

    #[error("error_rate must be within [0, 1] (got {0})")]
    ErrorRate(f64),

    #[error("{field} of {secs}s is too large to represent as a duration")]
    TooLarge { field: &'static str, secs: f64 },
}
