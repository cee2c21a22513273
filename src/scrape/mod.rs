//! Scrape module for company website probing
//!
//! This module contains the best-effort scraping half of enrichment:
//! - Candidate page list derived from the company website
//! - HTTP fetching with timeout, retry, and backoff
//! - HTML to plain text conversion and blocked-page detection
//! - Concurrent fan-out and character-budgeted aggregation

mod candidates;
mod extractor;
mod fetcher;
mod orchestrator;

pub use candidates::{build_page_list, CANDIDATE_PATHS};
pub use extractor::{extract_page_text, html_to_text, is_blocked_page, normalize_whitespace, Rejection};
pub use fetcher::{backoff_delay, build_http_client, FetchResult, FetchedPage, Fetcher};
pub use orchestrator::{aggregate_pages, settle_outcomes, PageText, ScrapeAggregate, Scraper};
