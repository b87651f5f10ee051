//! HTTP access with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`FetchText`]: Core trait, "GET this URL and give me the body text"
//! - [`HttpClient`]: `reqwest` implementation with a fixed timeout and User-Agent
//! - [`RetryFetch`]: Decorator that retries transient failures of any [`FetchText`]
//!
//! # Retry Strategy
//!
//! Only failures classified by [`FetchError::is_transient`] are retried:
//! HTTP 429/500/502/503/504, connection errors, and timeouts. Every request
//! made through this module is a GET, so retrying is always safe.
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=jitter)
//! ```

use crate::config::ScraperConfig;
use rand::{Rng, rng};
use reqwest::StatusCode;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Status codes worth another attempt.
const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Failure of a single GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("cannot build url from '{input}': {source}")]
    BadUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    /// Whether another attempt at the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            FetchError::Status { status, .. } => RETRY_STATUSES.contains(status),
            FetchError::BadUrl { .. } => false,
        }
    }
}

/// Trait for fetching a document as text.
pub trait FetchText {
    /// GET `url` and return the response body.
    ///
    /// Non-2xx responses are errors.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher. One instance (and one connection pool) per run.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

impl FetchText for HttpClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let t0 = Instant::now();
        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = resp.text().await.map_err(transport)?;
        debug!(
            %status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET ok"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchText`].
pub struct RetryFetch<T> {
    inner: T,
    /// Retries after the first attempt.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    /// Maximum delay cap.
    max_delay: Duration,
    /// Upper bound on random extra delay.
    jitter: Duration,
}

impl<T> RetryFetch<T>
where
    T: FetchText,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_millis(250),
        }
    }

    /// Wrap `inner` with the retry settings of `config`.
    pub fn from_config(inner: T, config: &ScraperConfig) -> Self {
        Self::new(inner, config.max_retries, config.backoff_base).with_jitter(config.backoff_jitter)
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng().random_range(0..=max_ms))
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .finish()
    }
}

/// Delay before retry number `attempt` (1-based), without jitter.
pub fn backoff_delay(base: Duration, attempt: usize, max: Duration) -> Duration {
    let exp = attempt.saturating_sub(1).min(31) as u32;
    base.saturating_mul(1u32 << exp).min(max)
}

impl<T> FetchText for RetryFetch<T>
where
    T: FetchText,
{
    #[instrument(level = "debug", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "GET exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = backoff_delay(self.base_delay, attempt, self.max_delay) + self.jitter();
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "GET failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
