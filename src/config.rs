//! Configuration loaded from `translation.toml`.
//!
//! [`AppConfig`] groups the server settings, the polling parameters and the
//! base URL the client talks to. Missing keys fall back to defaults. The
//! environment variables `TRANSLATION_BASE_URL` and `TRANSLATION_PORT` take
//! precedence over the file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::polling::StatusPollingConfig;
use crate::server::ServerSettings;

pub const DEFAULT_CONFIG_FILE: &str = "translation.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Where `poll` looks for the server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub polling: StatusPollingConfig,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            server: ServerSettings::default(),
            polling: StatusPollingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `translation.toml` in the current directory when no
    /// path is given. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    // Environment values override the file.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = var("TRANSLATION_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(port) = var("TRANSLATION_PORT").filter(|v| !v.is_empty()) {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("TRANSLATION_PORT is not a valid port: {port}"))?;
            self.server = self.server.clone().with_port(port);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.server.port(), 8080);
        assert_eq!(config.polling.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn deserialize_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            base_url = "http://127.0.0.1:9000"

            [server]
            completion_time = 20.0

            [polling]
            initial_delay = 1.0
            max_delay = 8.0
            backoff_factor = 3.0
            timeout = 60.0
        "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.server.completion_time(), Duration::from_secs(20));
        assert_eq!(config.server.error_rate(), 0.1);
        assert_eq!(config.polling.max_delay(), Duration::from_secs(8));
        assert_eq!(config.polling.backoff_factor(), 3.0);
    }

    #[test]
    fn invalid_polling_table_is_rejected() {
        let result = toml::from_str::<AppConfig>(
            r#"
            [polling]
            initial_delay = 5.0
            max_delay = 1.0
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9191\nerror_rate = 0.0").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port(), 9191);
        assert_eq!(config.server.error_rate(), 0.0);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        config
            .apply_env(|key| match key {
                "TRANSLATION_BASE_URL" => Some("http://example.test:1234".into()),
                "TRANSLATION_PORT" => Some("7070".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.base_url, "http://example.test:1234");
        assert_eq!(config.server.port(), 7070);
    }

    #[test]
    fn invalid_port_env_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| (key == "TRANSLATION_PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }
}
