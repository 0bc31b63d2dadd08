//! Timeout-bounded, retrying HTTP GET
//!
//! Used by the client to reach the proxy and by the proxy to reach the
//! upstream API. Each attempt runs under its own deadline; when the
//! deadline elapses the in-flight request future is dropped, which cancels
//! only that attempt.

use crate::error::{Result, TourError};
use crate::redact::redact_credential;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-attempt deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(200);

/// A fully-read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// One GET attempt, with no retry or deadline of its own
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

/// Production transport backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tour-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }
}

/// Deadline and retry bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for a single attempt, including the body read
    pub timeout: Duration,

    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }

    /// Delay after the zero-based `attempt` failed
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Retrying fetcher over any [`HttpTransport`]
///
/// URLs and errors are scrubbed of the credential before they are logged.
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    secret: Option<String>,
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            secret: None,
        }
    }

    /// Also scrub this literal secret (raw or percent-encoded) from log lines
    pub fn with_secret(mut self, secret: Option<&str>) -> Self {
        self.secret = secret.map(str::to_string);
        self
    }

    /// Fetcher over a fresh `reqwest` client
    pub fn with_reqwest(policy: RetryPolicy) -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?), policy))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url`, retrying timeouts, transport failures and 5xx responses.
    ///
    /// Responses below 500 (4xx included) are returned as-is on the first
    /// attempt that produces them.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let logged_url = self.redact(url);
        let mut attempt = 0;
        loop {
            let outcome = tokio::time::timeout(self.policy.timeout, self.transport.get(url)).await;

            let (error, retryable) = match outcome {
                Ok(Ok(response)) if response.status < 500 => {
                    debug!(
                        "Fetched {} with status {} (attempt {}/{})",
                        logged_url,
                        response.status,
                        attempt + 1,
                        self.policy.total_attempts()
                    );
                    return Ok(response);
                }
                Ok(Ok(response)) => (
                    TourError::http_status(
                        response.status,
                        format!("API request failed ({}): {}", response.status, response.body),
                    ),
                    true,
                ),
                Ok(Err(error)) => {
                    let retryable = error.is_transport();
                    (error, retryable)
                }
                Err(_elapsed) => (TourError::Timeout(self.policy.timeout), true),
            };

            if !retryable || attempt >= self.policy.max_retries {
                return Err(error);
            }

            let delay = self.policy.backoff(attempt);
            warn!(
                "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                attempt + 1,
                self.policy.total_attempts(),
                logged_url,
                self.redact(&error.to_string()),
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn redact(&self, text: &str) -> String {
        redact_credential(text, self.secret.as_deref())
    }
}
