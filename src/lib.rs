//! VC Scout: on-demand company enrichment
//!
//! This crate fetches a fixed set of likely pages on a company's website,
//! extracts readable text from them, and asks a language model to turn the
//! result (or, when the site is unreachable, just the company metadata) into a
//! structured profile for the deal-sourcing dashboard.

pub mod config;
pub mod extraction;
pub mod pipeline;
pub mod scrape;
pub mod server;
pub mod throttle;

use std::time::Duration;
use thiserror::Error;

/// Caller-facing errors produced by the enrichment pipeline
///
/// Per-page fetch failures never show up here; they are absorbed by the
/// scraper and only reduce the amount of content available for extraction.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Server misconfiguration: {0}")]
    Configuration(String),

    #[error("Rate limit exceeded. Try again in {}s.", retry_after_secs(*.retry_after))]
    ThrottleExceeded { retry_after: Duration },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid {provider} API key. Check the configured credential.")]
    ProviderAuth { provider: &'static str },

    #[error("{provider} rate limit hit. Wait a moment and try again.")]
    ProviderRateLimited { provider: &'static str },

    #[error("{provider} API error: {status}")]
    Provider { provider: &'static str, status: u16 },

    #[error("{provider} request failed: {source}")]
    ProviderTransport {
        provider: &'static str,
        source: reqwest::Error,
    },

    #[error("{provider} returned an empty response. Try again.")]
    EmptyResponse { provider: &'static str },

    #[error("Could not parse {provider} response as JSON. Try again.")]
    ExtractionParse { provider: &'static str },
}

impl EnrichError {
    /// HTTP status code the dashboard expects for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ThrottleExceeded { .. } => 429,
            Self::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// Whether resubmitting the same request later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ThrottleExceeded { .. }
                | Self::ProviderRateLimited { .. }
                | Self::ProviderTransport { .. }
                | Self::EmptyResponse { .. }
                | Self::ExtractionParse { .. }
        ) || matches!(self, Self::Provider { status, .. } if *status >= 500)
    }

    /// Wait advertised to the caller in the `Retry-After` header
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::ThrottleExceeded { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Rounds a wait up to whole seconds, as reported in messages and headers
pub fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs();
    if wait.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Why a single page could not be fetched
///
/// Only used to decide whether another attempt is worthwhile and for logging.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("not HTML (content type '{0}')")]
    ContentMismatch(String),
}

impl FetchError {
    /// 404 and 410 mean the page does not exist, and a non-HTML answer will
    /// not turn into HTML; retrying either is wasted work
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Status(404) | Self::Status(410) | Self::ContentMismatch(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extraction::{CompanyRecord, EnrichmentProfile, ScrapeStats};
pub use pipeline::{EnrichResponse, Enricher};
pub use scrape::{build_page_list, ScrapeAggregate, Scraper};
pub use throttle::{MemoryThrottleStore, ThrottleDecision, ThrottleStore};
