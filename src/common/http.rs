//! HTTP transport for public market data endpoints
//!
//! A thin wrapper over `reqwest` that owns timeouts, the user agent, and
//! retry with exponential backoff. Callers get either parsed JSON or a
//! [`TransportError`] once the retries are spent.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::SourceConfig;

/// Statuses worth retrying: rate limits and transient server errors
const RETRY_STATUSES: &[u16] = &[418, 429, 500, 502, 503, 504];

/// Transport failures surfaced after retries are exhausted
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub timeout: Duration,
    /// Base delay; attempt `n` waits `backoff * 2^(n-1)`
    pub backoff: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::from(&SourceConfig::default())
    }
}

impl From<&SourceConfig> for TransportConfig {
    fn from(sources: &SourceConfig) -> Self {
        Self {
            max_retries: sources.max_retries,
            timeout: Duration::from_secs(sources.timeout_secs),
            backoff: Duration::from_millis(sources.backoff_ms),
            user_agent: sources.user_agent.clone(),
        }
    }
}

impl TransportConfig {
    /// Set maximum retry attempts
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set backoff base delay
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt - 1))
    }
}

/// Whether a response status should be retried
pub fn is_retryable(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status.as_u16())
}

/// GET-only JSON client with retry
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: TransportConfig,
}

impl HttpClient {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(TransportError::Build)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// GET `url` with query parameters and parse the body as JSON
    ///
    /// Connection errors and [`is_retryable`] statuses are retried with
    /// backoff; any other non-success status fails immediately.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, TransportError> {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.config.backoff_delay(attempt);
                debug!("Retrying {} after {}ms", url, delay.as_millis());
                sleep(delay).await;
            }

            let error = match self.client.get(url).query(query).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json()
                        .await
                        .map_err(|source| TransportError::Decode {
                            url: url.to_string(),
                            source,
                        });
                }
                Ok(response) => {
                    let status = response.status();
                    let error = TransportError::Status {
                        url: url.to_string(),
                        status,
                    };
                    if !is_retryable(status) {
                        return Err(error);
                    }
                    error
                }
                Err(source) => TransportError::Request {
                    url: url.to_string(),
                    source,
                },
            };

            if attempt >= self.config.max_retries {
                return Err(error);
            }

            warn!(
                "Request failed (attempt {}/{}): {}",
                attempt + 1,
                self.config.max_retries + 1,
                error
            );
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::IM_A_TEAPOT));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_backoff_doubles() {
        let config = TransportConfig::default().with_backoff(Duration::from_millis(600));
        assert_eq!(config.backoff_delay(0), Duration::ZERO);
        assert_eq!(config.backoff_delay(1), Duration::from_millis(600));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(1200));
        assert_eq!(config.backoff_delay(4), Duration::from_millis(4800));
    }

    #[test]
    fn test_config_from_sources() {
        let config = TransportConfig::default();
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.timeout, Duration::from_secs(8));
        assert_eq!(config.user_agent, "GridPick/relaxed");
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_after_retries() {
        let config = TransportConfig::default()
            .with_max_retries(1)
            .with_backoff(Duration::from_millis(1))
            .with_timeout(Duration::from_millis(200));
        let client = HttpClient::new(config).unwrap();

        // Port 9 on localhost is discard; nothing listens there in CI
        let result = client.get_json("http://127.0.0.1:9/nothing", &[]).await;
        assert!(matches!(result, Err(TransportError::Request { .. })));
    }
}
