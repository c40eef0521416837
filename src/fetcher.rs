use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{FetchError, TransportError};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Status and body of one HTTP GET.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues a single GET without any retrying of its own.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<PageResponse, TransportError>;
}

/// Blocking reqwest client. Must be created, used and dropped off the async runtime.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<PageResponse, TransportError> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(PageResponse { status, body })
    }
}

/// When and how long to wait before repeating a failed GET.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            retryable_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry `retry` (0-based): `backoff_base * 2^retry`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(retry))
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

/// Page 1 is the bare listing URL, page N lives under `page/N/`.
pub fn page_url(listing_url: &str, page: usize) -> String {
    if page <= 1 {
        return listing_url.to_string();
    }
    let base = listing_url.trim_end_matches('/');
    format!("{}/page/{}/", base, page)
}

pub struct Fetcher {
    transport: Box<dyn Transport>,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// GET with retries. Any status outside the retryable set is returned as is,
    /// so the caller decides what a 404 means.
    pub fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let failure = match self.transport.get(url) {
                Ok(response) if self.retry.is_retryable(response.status) => {
                    if attempt >= max_attempts {
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            status: response.status,
                            attempts: attempt,
                        });
                    }
                    format!("status {}", response.status)
                }
                Ok(response) => {
                    debug!(url, status = response.status, attempt, "Fetched page");
                    return Ok(response);
                }
                Err(source) => {
                    if attempt >= max_attempts {
                        return Err(FetchError::Request {
                            url: url.to_string(),
                            attempts: attempt,
                            source,
                        });
                    }
                    source.to_string()
                }
            };

            let delay = self.retry.delay_for_retry(attempt - 1);
            warn!(
                "GET {} failed (attempt {}/{}): {}, retrying in {:?}",
                url, attempt, max_attempts, failure, delay
            );
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }
}
