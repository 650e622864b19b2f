//! Client-side polling parameters.
//!
//! [`StatusPollingConfig`] is validated on construction and immutable
//! afterwards. Deserialization goes through the same validation, so a bad
//! `[polling]` table in `translation.toml` is rejected while loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Validated polling parameters. Durations are stored as seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPollingConfig", into = "RawPollingConfig")]
pub struct StatusPollingConfig {
    initial_delay: f64,
    max_delay: f64,
    backoff_factor: f64,
    timeout: f64,
    jitter: bool,
    max_attempts: Option<u32>,
}

// Unvalidated shape of the `[polling]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPollingConfig {
    #[serde(default = "default_initial_delay")]
    initial_delay: f64,
    #[serde(default = "default_max_delay")]
    max_delay: f64,
    #[serde(default = "default_backoff_factor")]
    backoff_factor: f64,
    #[serde(default = "default_timeout")]
    timeout: f64,
    #[serde(default)]
    jitter: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_attempts: Option<u32>,
}

fn default_initial_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    32.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

// Five minutes.
fn default_timeout() -> f64 {
    300.0
}

impl Default for StatusPollingConfig {
    fn default() -> Self {
        Self {
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_factor: default_backoff_factor(),
            timeout: default_timeout(),
            jitter: false,
            max_attempts: None,
        }
    }
}

impl TryFrom<RawPollingConfig> for StatusPollingConfig {
    type Error = ConfigError;

    fn try_from(raw: RawPollingConfig) -> Result<Self, Self::Error> {
        let config = Self::new(raw.initial_delay, raw.max_delay, raw.backoff_factor, raw.timeout)?
            .with_jitter(raw.jitter);
        match raw.max_attempts {
            Some(n) => config.with_max_attempts(n),
            None => Ok(config),
        }
    }
}

impl From<StatusPollingConfig> for RawPollingConfig {
    fn from(config: StatusPollingConfig) -> Self {
        Self {
            initial_delay: config.initial_delay,
            max_delay: config.max_delay,
            backoff_factor: config.backoff_factor,
            timeout: config.timeout,
            jitter: config.jitter,
            max_attempts: config.max_attempts,
        }
    }
}

impl StatusPollingConfig {
    /// Validates and builds a config. All arguments except `backoff_factor`
    /// are in seconds.
    pub fn new(
        initial_delay: f64,
        max_delay: f64,
        backoff_factor: f64,
        timeout: f64,
    ) -> Result<Self, ConfigError> {
        if !initial_delay.is_finite() || initial_delay <= 0.0 {
            return Err(ConfigError::InitialDelay(initial_delay));
        }
        if !max_delay.is_finite() || max_delay < initial_delay {
            return Err(ConfigError::MaxDelay {
                initial_delay,
                max_delay,
            });
        }
        if !backoff_factor.is_finite() || backoff_factor < 1.0 {
            return Err(ConfigError::BackoffFactor(backoff_factor));
        }
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(ConfigError::Timeout(timeout));
        }
        // initial_delay <= max_delay, so checking max_delay covers both.
        for (field, secs) in [("max_delay", max_delay), ("timeout", timeout)] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::TooLarge { field, secs });
            }
        }
        Ok(Self {
            initial_delay,
            max_delay,
            backoff_factor,
            timeout,
            jitter: false,
            max_attempts: None,
        })
    }

    /// Enables up to 20% random extra delay, still capped at `max_delay`.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Caps the number of requests a session may issue.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::MaxAttempts);
        }
        self.max_attempts = Some(max_attempts);
        Ok(self)
    }

    /// Same config with a different overall budget.
    pub fn with_timeout(self, timeout: f64) -> Result<Self, ConfigError> {
        let max_attempts = self.max_attempts;
        let config = Self::new(self.initial_delay, self.max_delay, self.backoff_factor, timeout)?
            .with_jitter(self.jitter);
        Ok(Self {
            max_attempts,
            ..config
        })
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs_f64(self.initial_delay)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay)
    }

    pub(crate) fn initial_delay_secs(&self) -> f64 {
        self.initial_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout)
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = StatusPollingConfig::default();
        assert_eq!(config.initial_delay(), Duration::from_secs(1));
        assert_eq!(config.max_delay(), Duration::from_secs(32));
        assert_eq!(config.backoff_factor(), 2.0);
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert!(!config.jitter());
        assert_eq!(config.max_attempts(), None);
    }

    #[test]
    fn rejects_non_positive_initial_delay() {
        assert_eq!(
            StatusPollingConfig::new(0.0, 1.0, 2.0, 5.0).unwrap_err(),
            ConfigError::InitialDelay(0.0)
        );
        assert!(StatusPollingConfig::new(-1.0, 1.0, 2.0, 5.0).is_err());
    }

    #[test]
    fn rejects_max_delay_below_initial() {
        assert!(matches!(
            StatusPollingConfig::new(2.0, 1.0, 2.0, 5.0),
            Err(ConfigError::MaxDelay { .. })
        ));
    }

    #[test]
    fn rejects_backoff_factor_below_one() {
        assert_eq!(
            StatusPollingConfig::new(1.0, 2.0, 0.5, 5.0).unwrap_err(),
            ConfigError::BackoffFactor(0.5)
        );
    }

    #[test]
    fn rejects_bad_timeout_and_non_finite_values() {
        assert_eq!(
            StatusPollingConfig::new(1.0, 2.0, 2.0, 0.0).unwrap_err(),
            ConfigError::Timeout(0.0)
        );
        assert!(StatusPollingConfig::new(f64::NAN, 2.0, 2.0, 1.0).is_err());
        assert!(StatusPollingConfig::new(1.0, f64::INFINITY, 2.0, 1.0).is_err());
        assert!(StatusPollingConfig::new(1.0, 2.0, 2.0, f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_values_beyond_duration_range() {
        assert_eq!(
            StatusPollingConfig::new(1.0, 2.0, 2.0, 1e20).unwrap_err(),
            ConfigError::TooLarge {
                field: "timeout",
                secs: 1e20
            }
        );
        assert_eq!(
            StatusPollingConfig::new(1.0, 1e25, 2.0, 60.0).unwrap_err(),
            ConfigError::TooLarge {
                field: "max_delay",
                secs: 1e25
            }
        );
        assert!(StatusPollingConfig::default().with_timeout(1e20).is_err());
        assert!(toml::from_str::<StatusPollingConfig>("timeout = 1e20").is_err());
    }

    #[test]
    fn equal_initial_and_max_delay_is_valid() {
        let config = StatusPollingConfig::new(1.0, 1.0, 1.0, 1.0).unwrap();
        assert_eq!(config.initial_delay(), config.max_delay());
    }

    #[test]
    fn max_attempts_must_be_positive() {
        let config = StatusPollingConfig::default();
        assert_eq!(
            config.clone().with_max_attempts(0).unwrap_err(),
            ConfigError::MaxAttempts
        );
        assert_eq!(config.with_max_attempts(3).unwrap().max_attempts(), Some(3));
    }

    #[test]
    fn with_timeout_keeps_other_settings() {
        let config = StatusPollingConfig::new(0.5, 2.0, 3.0, 10.0)
            .unwrap()
            .with_jitter(true)
            .with_max_attempts(4)
            .unwrap()
            .with_timeout(2.0)
            .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.backoff_factor(), 3.0);
        assert!(config.jitter());
        assert_eq!(config.max_attempts(), Some(4));
    }

    #[test]
    fn deserialize_partial_toml() {
        let config: StatusPollingConfig = toml::from_str(
            r#"
            initial_delay = 0.5
            timeout = 60.0
            jitter = true
        "#,
        )
        .unwrap();
        assert_eq!(config.initial_delay(), Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_delay(), Duration::from_secs(32));
        assert!(config.jitter());
    }

    #[test]
    fn deserialize_rejects_invalid_values() {
        let result = toml::from_str::<StatusPollingConfig>("backoff_factor = 0.9");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("backoff_factor"), "unexpected error: {err}");
    }
}
