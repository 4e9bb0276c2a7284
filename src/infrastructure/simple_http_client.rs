//! HTTP client for listing and case page retrieval
//!
//! Wraps `reqwest` with a configured user agent, redirect policy and retry
//! with exponential backoff on network errors and transient HTTP statuses.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::config::HttpConfig;
use super::page_fetcher::{FetchError, FetchMode, PageFetcher};

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Total attempts per request, including the first
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further attempt
    pub retry_base_delay_ms: u64,
    pub user_agent: String,
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    pub fn from_http_config(http: &HttpConfig) -> Self {
        Self {
            timeout_seconds: http.timeout_seconds,
            max_retries: http.max_retries,
            retry_base_delay_ms: http.retry_base_delay_ms,
            user_agent: http.user_agent.clone(),
            follow_redirects: http.follow_redirects,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_http_config(&HttpConfig::default())
    }
}

/// Whether a response status is worth another attempt
fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn from_http_config(http: &HttpConfig) -> Result<Self> {
        Self::with_config(HttpClientConfig::from_http_config(http))
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    fn request(&self, url: &str, mode: FetchMode) -> RequestBuilder {
        let request = self.client.get(url);
        match mode {
            FetchMode::Html => request,
            FetchMode::Json => request
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .header("X-Requested-With", HeaderValue::from_static("XMLHttpRequest")),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.config.retry_base_delay_ms.saturating_mul(factor))
    }

    /// Wait before the next attempt: the backoff, stretched to honour a
    /// `Retry-After` hint, never longer than one request timeout
    fn retry_delay(&self, attempt: u32, retry_after_seconds: Option<u64>) -> Duration {
        let ceiling = Duration::from_secs(self.config.timeout_seconds.max(1));
        let hinted = retry_after_seconds.map(Duration::from_secs).unwrap_or_default();
        self.backoff(attempt).max(hinted).min(ceiling)
    }

    /// GET with the retry policy applied, returning the body text
    pub async fn fetch_with_policy(
        &self,
        url: &str,
        mode: FetchMode,
    ) -> Result<String, FetchError> {
        reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let max_attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            debug!("HTTP GET (attempt {}/{}, {:?}): {}", attempt, max_attempts, mode, url);

            match self.request(url, mode).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|e| FetchError::Body {
                            url: url.to_string(),
                            reason: e.to_string(),
                        });
                    }

                    let error = FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    };
                    if !is_retryable(status) || attempt == max_attempts {
                        return Err(error);
                    }

                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(|value| value.trim().parse::<u64>().ok());
                    let delay = self.retry_delay(attempt, retry_after);
                    warn!(
                        "HTTP {} on attempt {} for {}, retrying in {:?}",
                        status, attempt, url, delay
                    );
                    last_error = Some(error);
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!("Network error on attempt {} for {}: {}", attempt, url, e);
                    last_error = Some(FetchError::Network {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                    if attempt < max_attempts {
                        sleep(self.retry_delay(attempt, None)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::Network {
            url: url.to_string(),
            reason: "no attempt was made".to_string(),
        }))
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_text(&self, url: &str, mode: FetchMode) -> Result<String, FetchError> {
        info!("Fetching {}", url);
        self.fetch_with_policy(url, mode).await
    }
}
