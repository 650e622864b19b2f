use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout_at};

use super::backoff::BackoffPolicy;
use super::config::StatusPollingConfig;
use super::error::{ObserverError, PollError, SessionSnapshot};
use crate::client::{FetchError, StatusSource, TranslationClient};
use crate::status::{JobStatus, StatusResponse};

/// Receives every distinct status a polling session observes.
///
/// Runs synchronously inside the loop; an `Err` aborts the session.
pub trait StatusObserver {
    fn on_status_change(&self, response: &StatusResponse) -> Result<(), ObserverError>;
}

impl StatusObserver for () {
    fn on_status_change(&self, _response: &StatusResponse) -> Result<(), ObserverError> {
        Ok(())
    }
}

impl<F> StatusObserver for F
where
    F: Fn(&StatusResponse) -> Result<(), ObserverError>,
{
    fn on_status_change(&self, response: &StatusResponse) -> Result<(), ObserverError> {
        self(response)
    }
}

// Roughly 30 years; stands in for deadlines past the end of Instant's range.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(from: Instant, delay: Duration) -> Instant {
    from.checked_add(delay).unwrap_or_else(|| from + FAR_FUTURE)
}

/// Mutable state of one `poll_until_complete` call.
struct PollingSession {
    start_time: Instant,
    deadline: Instant,
    attempt_count: u32,
    current_delay: Duration,
    last_status: Option<JobStatus>,
    last_error: Option<String>,
}

impl PollingSession {
    fn start(timeout: Duration) -> Self {
        let start_time = Instant::now();
        Self {
            start_time,
            deadline: deadline_after(start_time, timeout),
            attempt_count: 0,
            current_delay: Duration::ZERO,
            last_status: None,
            last_error: None,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            attempts: self.attempt_count,
            elapsed: self.start_time.elapsed(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
        }
    }

    fn timed_out(&self, timeout: Duration) -> PollError {
        let session = self.snapshot();
        tracing::warn!(%session, "polling deadline exceeded");
        PollError::Timeout { timeout, session }
    }
}

/// Polls a [`StatusSource`] until the job reaches a terminal status.
///
/// Requests are spaced by [`BackoffPolicy`]; the whole session is bounded by
/// the config's `timeout`, which also cuts short an in-flight request or
/// delay. Transient fetch failures are retried, everything else ends the
/// session.
pub struct PollingOrchestrator<S, O = ()> {
    source: S,
    config: StatusPollingConfig,
    observer: O,
}

impl PollingOrchestrator<TranslationClient> {
    /// Orchestrator over HTTP against `base_url`.
    pub fn for_url(base_url: &str, config: StatusPollingConfig) -> Result<Self, FetchError> {
        Ok(Self::new(TranslationClient::new(base_url)?, config))
    }
}

impl<S: StatusSource> PollingOrchestrator<S> {
    pub fn new(source: S, config: StatusPollingConfig) -> Self {
        Self {
            source,
            config,
            observer: (),
        }
    }
}

impl<S: StatusSource, O: StatusObserver> PollingOrchestrator<S, O> {
    pub fn with_observer<T: StatusObserver>(self, observer: T) -> PollingOrchestrator<S, T> {
        PollingOrchestrator {
            source: self.source,
            config: self.config,
            observer,
        }
    }

    /// Registers a closure as the observer.
    pub fn on_status_change<F>(self, callback: F) -> PollingOrchestrator<S, F>
    where
        F: Fn(&StatusResponse) -> Result<(), ObserverError>,
    {
        self.with_observer(callback)
    }

    pub fn config(&self) -> &StatusPollingConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Polls until `completed` or `error`, returning that response.
    ///
    /// The first request goes out immediately. A job that ends in `error`
    /// is returned as `Ok`; callers inspect `status`.
    pub async fn poll_until_complete(&self) -> Result<StatusResponse, PollError> {
        let timeout = self.config.timeout();
        let mut session = PollingSession::start(timeout);

        loop {
            session.attempt_count += 1;
            let attempt = session.attempt_count;

            let fetched = match timeout_at(session.deadline, self.source.fetch_status()).await {
                Ok(fetched) => fetched,
                Err(_) => return Err(session.timed_out(timeout)),
            };

            match fetched {
                Ok(response) => {
                    session.last_error = None;
                    if session.last_status != Some(response.status) {
                        session.last_status = Some(response.status);
                        tracing::debug!(
                            attempt,
                            status = %response.status,
                            elapsed_time = response.elapsed_time,
                            "job status changed"
                        );
                        if let Err(e) = self.observer.on_status_change(&response) {
                            tracing::error!(attempt, error = %e, "status observer failed");
                            return Err(PollError::Observer(e));
                        }
                    }
                    if response.is_terminal() {
                        tracing::info!(
                            attempts = attempt,
                            status = %response.status,
                            elapsed_time = response.elapsed_time,
                            "job finished"
                        );
                        return Ok(response);
                    }
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "transient status failure");
                    session.last_error = Some(e.to_string());
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "fatal status failure");
                    return Err(PollError::Fatal { attempt, source: e });
                }
            }

            if let Some(max_attempts) = self.config.max_attempts() {
                if attempt >= max_attempts {
                    return Err(PollError::AttemptsExhausted {
                        max_attempts,
                        session: session.snapshot(),
                    });
                }
            }

            if session.is_expired() {
                return Err(session.timed_out(timeout));
            }

            session.current_delay = BackoffPolicy::delay_for(attempt - 1, &self.config);
            tracing::debug!(
                attempt,
                delay_ms = session.current_delay.as_millis() as u64,
                "waiting before next attempt"
            );
            let wake = deadline_after(Instant::now(), session.current_delay);
            sleep_until(wake.min(session.deadline)).await;

            if session.is_expired() {
                return Err(session.timed_out(timeout));
            }
        }
    }
}
