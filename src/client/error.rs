//! Failures of a single `GET /status` call.
//!
//! [`FetchError::is_retryable`] is the one place that decides whether the
//! polling loop backs off and tries again or gives up immediately.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-200 status line.
    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    /// Connection refused, reset, DNS failure or transport timeout.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body was not a valid status document.
    #[error("malformed status response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Transient faults are worth another attempt; everything else is fatal.
    ///
    /// 5xx, 408 (request timeout) and 429 (rate limited) are transient. Any
    /// other 4xx means the request itself is wrong and will not get better.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            FetchError::Network(e) => !(e.is_builder() || e.is_decode() || e.is_redirect()),
            FetchError::Malformed(_) => false,
        }
    }
}
