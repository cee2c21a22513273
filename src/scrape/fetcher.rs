//! HTTP fetcher implementation
//!
//! This module handles all page requests made while scraping, including:
//! - Building the HTTP client with browser-like headers
//! - A hard wall-clock timeout per attempt
//! - Retry with backoff for transient failures
//! - Error classification (permanent vs. transient)

use crate::config::{ScraperConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// A page that answered with a 2xx status
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value (empty when absent)
    pub content_type: String,
    /// Page body content
    pub body: String,
}

/// Result of a fetch operation
///
/// The fetcher never returns an error: once retries are exhausted, or the
/// failure is permanent, the page is simply unavailable.
#[derive(Debug)]
pub enum FetchResult {
    Success(FetchedPage),

    /// Answered with something other than HTML; the body was never read
    ContentMismatch { content_type: String },

    Unavailable {
        /// Attempts made before giving up
        attempts: u32,
        /// The failure that ended the last attempt
        cause: FetchError,
    },
}

impl FetchResult {
    pub fn into_page(self) -> Option<FetchedPage> {
        match self {
            Self::Success(page) => Some(page),
            Self::ContentMismatch { .. } | Self::Unavailable { .. } => None,
        }
    }
}

/// Builds an HTTP client for page fetching
///
/// Sends a descriptive user agent plus `Accept` and `Accept-Language`
/// headers, which reduces false positives from bot filters. Redirects are
/// followed (up to 10 hops).
///
/// # Example
///
/// ```
/// use vcscout::config::UserAgentConfig;
/// use vcscout::scrape::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,*/*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .user_agent(config.header_value())
        .default_headers(headers)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Delay before the next attempt
///
/// HTTP status failures back off exponentially (`base × 2^(attempt-1)`),
/// transport failures linearly (`base × attempt`).
pub fn backoff_delay(base: Duration, attempt: u32, cause: &FetchError) -> Duration {
    match cause {
        FetchError::Status(_) => base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1))),
        FetchError::Timeout(_) | FetchError::Transport(_) => base.saturating_mul(attempt),
        FetchError::ContentMismatch(_) => Duration::ZERO,
    }
}

/// Fetches single pages with retry logic
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return the page |
/// | HTTP 404 / 410 | Immediate → Unavailable |
/// | Non-HTML Content-Type | Immediate → ContentMismatch, body not read |
/// | Other HTTP status | Back off, retry |
/// | Timeout | Back off, retry |
/// | Connection / TLS / body error | Back off, retry |
///
/// After `max_attempts` the page is Unavailable.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_attempts: u32,
    backoff_base: Duration,
}

impl Fetcher {
    pub fn new(client: Client, config: &ScraperConfig) -> Self {
        Self {
            client,
            timeout: config.fetch_timeout(),
            max_attempts: config.max_attempts.max(1),
            backoff_base: config.backoff_base(),
        }
    }

    /// Fetches a URL, retrying transient failures
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let mut attempt = 1;

        loop {
            match self.attempt(url).await {
                Ok(page) => {
                    tracing::debug!(url, attempt, status = page.status_code, "Fetched page");
                    return FetchResult::Success(page);
                }
                Err(FetchError::ContentMismatch(content_type)) => {
                    tracing::debug!(url, content_type = %content_type, "Skipping non-HTML page");
                    return FetchResult::ContentMismatch { content_type };
                }
                Err(cause) if cause.is_permanent() || attempt >= self.max_attempts => {
                    tracing::debug!(url, attempt, %cause, "Page unavailable");
                    return FetchResult::Unavailable {
                        attempts: attempt,
                        cause,
                    };
                }
                Err(cause) => {
                    match &cause {
                        FetchError::Timeout(_) => {
                            tracing::warn!(url, attempt, "Fetch attempt timed out")
                        }
                        FetchError::Transport(e) => {
                            tracing::warn!(url, attempt, "Fetch attempt failed: {}", e)
                        }
                        other => tracing::debug!(url, attempt, "Fetch attempt failed: {}", other),
                    }

                    tokio::time::sleep(backoff_delay(self.backoff_base, attempt, &cause)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One attempt, aborted once the timeout elapses
    ///
    /// The timeout covers the response headers and the body.
    async fn attempt(&self, url: &str) -> Result<FetchedPage, FetchError> {
        tokio::time::timeout(self.timeout, self.get(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }

    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.to_ascii_lowercase().contains("text/html") {
            return Err(FetchError::ContentMismatch(content_type));
        }

        let body = response.text().await?;

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}
