use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use super::error::FetchError;
use crate::status::StatusResponse;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can report the current job status once.
///
/// The polling loop only depends on this capability, so tests can drive it
/// with a scripted source instead of a live server.
pub trait StatusSource {
    fn fetch_status(&self) -> impl Future<Output = Result<StatusResponse, FetchError>> + Send;
}

/// HTTP client for the translation server's `GET /status` endpoint.
#[derive(Debug, Clone)]
pub struct TranslationClient {
    client: Client,
    base_url: String,
}

impl TranslationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an existing reqwest client (shared pools, custom timeouts).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn status_url(&self) -> String {
        format!("{}/status", self.base_url)
    }
}

impl StatusSource for TranslationClient {
    async fn fetch_status(&self) -> Result<StatusResponse, FetchError> {
        let url = self.status_url();
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response
                .text()
                .await
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            tracing::error!(%url, status = status.as_u16(), %message, "status request failed");
            return Err(FetchError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(%url, error = %e, "unexpected status body");
            FetchError::Malformed(e.to_string())
        })
    }
}
