use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use rand::Rng;
use uuid::Uuid;

use crate::error::ConfigError;
use crate::status::JobStatus;

/// How a job ends once its completion time has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

impl Outcome {
    pub fn status(self) -> JobStatus {
        match self {
            Outcome::Completed => JobStatus::Completed,
            Outcome::Failed => JobStatus::Error,
        }
    }

    /// Draws an outcome against `error_rate`. Rates of 0 and 1 never touch the RNG.
    pub fn roll<R: Rng>(error_rate: f64, rng: &mut R) -> Self {
        if error_rate <= 0.0 {
            Outcome::Completed
        } else if error_rate >= 1.0 || rng.random_bool(error_rate) {
            Outcome::Failed
        } else {
            Outcome::Completed
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.status(), f)
    }
}

/// The single simulated translation job served by `GET /status`.
///
/// Everything but the outcome is fixed at construction. The outcome starts
/// undecided and is decided at most once, inside [`OnceLock::get_or_init`],
/// so concurrent queries at the completion boundary cannot disagree.
#[derive(Debug)]
pub struct Job {
    id: String,
    created_at: Instant,
    completion_time: Duration,
    error_rate: f64,
    outcome: OnceLock<Outcome>,
}

impl Job {
    /// Creates a job whose clock starts now.
    pub fn new(completion_time: Duration, error_rate: f64) -> Result<Self, ConfigError> {
        Self::started_at(Instant::now(), completion_time, error_rate)
    }

    pub fn started_at(
        created_at: Instant,
        completion_time: Duration,
        error_rate: f64,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ConfigError::ErrorRate(error_rate));
        }
        Ok(Self::unchecked(created_at, completion_time, error_rate))
    }

    // Callers guarantee `error_rate` is within [0, 1].
    pub(crate) fn unchecked(created_at: Instant, completion_time: Duration, error_rate: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at,
            completion_time,
            error_rate,
            outcome: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn completion_time(&self) -> Duration {
        self.completion_time
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// The decided outcome, or `None` while no query has crossed the threshold.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome.get().copied()
    }

    /// Returns the terminal outcome, deciding it on the first call.
    pub fn resolve_outcome(&self) -> Outcome {
        self.resolve_outcome_with(&mut rand::rng())
    }

    pub fn resolve_outcome_with<R: Rng>(&self, rng: &mut R) -> Outcome {
        *self.outcome.get_or_init(|| {
            let outcome = Outcome::roll(self.error_rate, rng);
            tracing::info!(job_id = %self.id, %outcome, "terminal outcome decided");
            outcome
        })
    }
}
