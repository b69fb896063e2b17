//! Shared HTTP client for PaperMC and Discord REST requests.
//!
//! Every request carries the fixed relay User-Agent and the 10 second
//! timeout from [`crate::config::REQUEST_TIMEOUT`]. Nothing here retries.

use crate::config::REQUEST_TIMEOUT;
use crate::error::{RelayError, Result};

/// User-Agent sent on every outbound request.
pub const USER_AGENT: &str = concat!(
    "paperwatch/",
    env!("CARGO_PKG_VERSION"),
    " (+discord build notifier)"
);

/// Build a [`reqwest::Client`] with the relay User-Agent and timeout.
///
/// # Errors
///
/// Returns [`RelayError::Config`] if the client cannot be constructed.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {e}")))
}

/// JSON-over-GET client for the upstream build API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Create a client with the relay defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
        })
    }

    /// Wrap an already configured [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET `url` and decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Request`] on transport failure, timeout,
    /// non-success status, or an undecodable body.
    pub async fn get(&self, url: &str) -> Result<serde_json::Value> {
        let result = self.fetch(url).await;
        if let Err(ref e) = result {
            tracing::warn!(url = %url, "upstream request failed: {e}");
        }
        result
    }

    async fn fetch(&self, url: &str) -> Result<serde_json::Value> {
        let request_error = |cause: String| RelayError::Request {
            url: url.to_owned(),
            cause,
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                request_error(format!("timed out after {}s", REQUEST_TIMEOUT.as_secs()))
            } else {
                request_error(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(request_error(format!("unexpected status {status}")));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| request_error(format!("invalid JSON body: {e}")))
    }
}
