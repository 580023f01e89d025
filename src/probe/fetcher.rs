//! Shared HTTP fetcher for probes and record validation
//!
//! One reqwest client with a bounded per-request timeout, plus a
//! process-wide rate limiter so a probe cycle never hammers the catalog
//! servers harder than configured.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::FetchError;

/// A successful HTTP response
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Response status code (a success status)
    pub status: u16,

    /// Response body, decoded to text
    pub body: String,
}

/// HTTP fetcher with timeout and rate limiting
pub struct HttpFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpFetcher {
    /// Create a new fetcher
    ///
    /// # Arguments
    ///
    /// * `timeout` - Per-request timeout
    /// * `requests_per_second` - Maximum number of requests per second
    /// * `user_agent` - User agent string sent with every request
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(
        timeout: Duration,
        requests_per_second: u32,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent)
            .build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate);
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Issue a GET and return the body of a successful response
    ///
    /// # Errors
    ///
    /// * `FetchError::Timeout` - the request or body read timed out
    /// * `FetchError::Status` - the server answered with a non-success code
    /// * `FetchError::Http` - any other transport-level failure
    pub async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify_transport)?;

        Ok(Fetched {
            status: status.as_u16(),
            body,
        })
    }
}

/// Fold reqwest's timeout flag into the explicit `Timeout` variant
fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(err)
    }
}
