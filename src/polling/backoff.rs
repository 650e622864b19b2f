use std::time::Duration;

use rand::Rng;

use super::config::StatusPollingConfig;

/// Largest extra fraction jitter may add on top of the computed delay.
const MAX_JITTER: f64 = 0.2;

/// Exponential backoff between polls.
///
/// Only maps an attempt index to a delay; deadlines are the orchestrator's
/// concern.
pub struct BackoffPolicy;

impl BackoffPolicy {
    /// Delay to wait before the next request.
    ///
    /// `attempt` is 0 for the delay before the first retry:
    /// `min(initial_delay * backoff_factor^attempt, max_delay)`.
    pub fn next_delay(attempt: u32, config: &StatusPollingConfig) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = config.initial_delay_secs() * config.backoff_factor().powi(exponent);
        clamp_secs(delay, config.max_delay())
    }

    /// `next_delay` plus up to 20% random extra, never above `max_delay`.
    pub fn jittered_delay<R: Rng>(
        attempt: u32,
        config: &StatusPollingConfig,
        rng: &mut R,
    ) -> Duration {
        let base = Self::next_delay(attempt, config);
        let factor = 1.0 + rng.random_range(0.0..=MAX_JITTER);
        clamp_secs(base.as_secs_f64() * factor, config.max_delay())
    }

    /// The delay the orchestrator actually sleeps for, honouring `config.jitter()`.
    pub fn delay_for(attempt: u32, config: &StatusPollingConfig) -> Duration {
        if config.jitter() {
            Self::jittered_delay(attempt, config, &mut rand::rng())
        } else {
            Self::next_delay(attempt, config)
        }
    }
}

// Seconds beyond what a Duration holds (including +inf from powi) saturate to max.
fn clamp_secs(secs: f64, max: Duration) -> Duration {
    Duration::try_from_secs_f64(secs).map_or(max, |d| d.min(max))
}
