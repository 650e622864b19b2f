use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::client::FetchError;
use crate::status::JobStatus;

/// Error type a [`StatusObserver`](super::StatusObserver) may return.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Where a polling session stood when it gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub attempts: u32,
    pub elapsed: Duration,
    pub last_status: Option<JobStatus>,
    /// Most recent transient failure, if the last attempt failed.
    pub last_error: Option<String>,
}

impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempt(s) over {:.2}s, last status: ",
            self.attempts,
            self.elapsed.as_secs_f64()
        )?;
        match self.last_status {
            Some(status) => write!(f, "{status}")?,
            None => write!(f, "none")?,
        }
        if let Some(err) = &self.last_error {
            write!(f, ", last error: {err}")?;
        }
        Ok(())
    }
}

/// Why `poll_until_complete` returned without a terminal status.
///
/// A job that ends in `error` is not a `PollError`; it comes back as an
/// ordinary [`StatusResponse`](crate::status::StatusResponse).
#[derive(Debug, Error)]
pub enum PollError {
    /// Non-retryable failure (malformed body, 4xx). Never retried.
    #[error("fatal error on attempt {attempt}: {source}")]
    Fatal {
        attempt: u32,
        #[source]
        source: FetchError,
    },

    /// The session deadline passed while pending or retrying.
    #[error("job did not finish within {:.2}s ({session})", .timeout.as_secs_f64())]
    Timeout {
        timeout: Duration,
        session: SessionSnapshot,
    },

    /// `max_attempts` requests were made without reaching a terminal status.
    #[error("gave up after {max_attempts} attempts ({session})")]
    AttemptsExhausted {
        max_attempts: u32,
        session: SessionSnapshot,
    },

    /// The status observer rejected a notification.
    #[error("status observer failed: {0}")]
    Observer(#[source] ObserverError),
}

impl PollError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout { .. })
    }

    /// Session diagnostics, for the variants that carry them.
    pub fn session(&self) -> Option<&SessionSnapshot> {
        match self {
            PollError::Timeout { session, .. } | PollError::AttemptsExhausted { session, .. } => {
                Some(session)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            attempts: 3,
            elapsed: Duration::from_millis(2010),
            last_status: Some(JobStatus::Pending),
            last_error: None,
        }
    }

    #[test]
    fn timeout_display_includes_diagnostics() {
        let err = PollError::Timeout {
            timeout: Duration::from_secs(2),
            session: snapshot(),
        };
        assert_eq!(
            err.to_string(),
            "job did not finish within 2.00s (3 attempt(s) over 2.01s, last status: pending)"
        );
        assert!(err.is_timeout());
        assert_eq!(err.session().map(|s| s.attempts), Some(3));
    }

    #[test]
    fn snapshot_display_without_status_shows_last_error() {
        let session = SessionSnapshot {
            attempts: 1,
            elapsed: Duration::from_millis(500),
            last_status: None,
            last_error: Some("network error: connection refused".into()),
        };
        assert_eq!(
            session.to_string(),
            "1 attempt(s) over 0.50s, last status: none, last error: network error: connection refused"
        );
    }

    #[test]
    fn fatal_display_and_source() {
        let err = PollError::Fatal {
            attempt: 1,
            source: FetchError::Malformed("missing field `status`".into()),
        };
        assert_eq!(
            err.to_string(),
            "fatal error on attempt 1: malformed status response: missing field `status`"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.session().is_none());
    }

    #[test]
    fn observer_error_display() {
        let err = PollError::Observer("sink closed".into());
        assert_eq!(err.to_string(), "status observer failed: sink closed");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PollError>();
    }
}
