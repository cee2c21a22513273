//! Scrape orchestration - concurrent fetch and aggregation
//!
//! Every candidate page is fetched and extracted in its own task. All tasks
//! are awaited to completion (a failed or panicked task never cancels its
//! siblings), then results are folded in candidate order under a total
//! character budget. Wall-clock time is bounded by the slowest page, not the
//! sum over pages.

use super::candidates::build_page_list;
use super::extractor::{extract_page_text, truncate_chars};
use super::fetcher::{build_http_client, Fetcher};
use crate::config::{ScraperConfig, UserAgentConfig};
use futures::future::join_all;
use tokio::task::JoinError;

/// Usable text scraped from one candidate URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub url: String,
    pub text: String,
}

/// Everything the scrape produced for one company
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeAggregate {
    /// `--- URL ---` tagged chunks joined by blank lines
    pub scraped_text: String,
    /// URLs whose text made it into `scraped_text`, in candidate order
    pub successful_urls: Vec<String>,
    /// Every candidate URL, whether or not it produced anything
    pub attempted_urls: Vec<String>,
}

impl ScrapeAggregate {
    /// Character count of the aggregated text
    pub fn chars_scraped(&self) -> usize {
        self.scraped_text.chars().count()
    }
}

/// Scrapes the candidate pages of a company website
#[derive(Debug, Clone)]
pub struct Scraper {
    fetcher: Fetcher,
    config: ScraperConfig,
}

impl Scraper {
    pub fn new(fetcher: Fetcher, config: ScraperConfig) -> Self {
        Self { fetcher, config }
    }

    /// Builds a scraper with its own HTTP client
    pub fn from_config(
        config: &ScraperConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent)?;
        Ok(Self::new(Fetcher::new(client, config), config.clone()))
    }

    /// Fetches and extracts every candidate page concurrently
    ///
    /// Never fails: if nothing is usable the aggregate has empty text and no
    /// successful URLs, but still lists every attempted URL.
    pub async fn scrape_company(&self, website: &str) -> ScrapeAggregate {
        let pages = build_page_list(website);

        let tasks = pages.iter().map(|url| {
            let scraper = self.clone();
            let url = url.clone();
            tokio::spawn(async move { scraper.scrape_page(url).await })
        });

        let outcomes = settle_outcomes(&pages, join_all(tasks).await);

        aggregate_pages(pages, outcomes, self.config.max_total_chars)
    }

    /// Fetch + extract for one candidate; `None` means no usable content
    async fn scrape_page(&self, url: String) -> Option<PageText> {
        let page = self.fetcher.fetch(&url).await.into_page()?;

        match extract_page_text(&page, &self.config) {
            Ok(text) => Some(PageText { url, text }),
            Err(rejection) => {
                tracing::debug!(url = %url, ?rejection, "Discarding page");
                None
            }
        }
    }
}

/// Maps joined page tasks to outcomes; a task that panicked or was
/// cancelled counts as a page without content
pub fn settle_outcomes(
    pages: &[String],
    joined: Vec<Result<Option<PageText>, JoinError>>,
) -> Vec<Option<PageText>> {
    joined
        .into_iter()
        .zip(pages)
        .map(|(result, url)| match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(url = %url, "Page task failed: {}", e);
                None
            }
        })
        .collect()
}

/// Folds per-page outcomes into a [`ScrapeAggregate`]
///
/// `outcomes` must be in the same order as `attempted`. Chunks are taken
/// whole, in order, until the running text total reaches `max_total_chars`;
/// the joined result is then hard-truncated to that ceiling.
pub fn aggregate_pages(
    attempted: Vec<String>,
    outcomes: Vec<Option<PageText>>,
    max_total_chars: usize,
) -> ScrapeAggregate {
    let mut chunks = Vec::new();
    let mut successful_urls = Vec::new();
    let mut total_chars = 0usize;

    for page in outcomes.into_iter().flatten() {
        if total_chars >= max_total_chars {
            break;
        }

        total_chars += page.text.chars().count();
        chunks.push(format!("--- {} ---\n{}", page.url, page.text));
        successful_urls.push(page.url);
    }

    ScrapeAggregate {
        scraped_text: truncate_chars(&chunks.join("\n\n"), max_total_chars),
        successful_urls,
        attempted_urls: attempted,
    }
}
