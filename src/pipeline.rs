//! Enrichment pipeline entry point
//!
//! Sequences one enrichment request:
//! 1. Fail fast if no model credential is configured
//! 2. Throttle by client identity
//! 3. Parse and validate the company payload
//! 4. Scrape (best-effort; any escaping failure degrades to an empty scrape)
//! 5. Extract the profile
//!
//! Only credential, throttle, payload, and extraction failures reach the caller.

use crate::config::Config;
use crate::extraction::{CompanyRecord, EnrichmentProfile, ExtractionClient};
use crate::scrape::{ScrapeAggregate, Scraper};
use crate::throttle::{MemoryThrottleStore, ThrottleStore};
use crate::{EnrichError, Result};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Request body accepted by the enrichment endpoint
#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    pub company: Option<CompanyRecord>,
}

/// Successful enrichment plus the caller's remaining request budget
#[derive(Debug, Clone)]
pub struct EnrichResponse {
    pub profile: EnrichmentProfile,
    pub remaining: u32,
}

/// Runs enrichment requests end to end
pub struct Enricher {
    scraper: Scraper,
    extraction: ExtractionClient,
    throttle: Arc<dyn ThrottleStore>,
    api_key: Option<String>,
}

impl Enricher {
    pub fn new(
        scraper: Scraper,
        extraction: ExtractionClient,
        throttle: Arc<dyn ThrottleStore>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            scraper,
            extraction,
            throttle,
            api_key,
        }
    }

    /// Builds an enricher from configuration
    ///
    /// The credential is read from the environment variable named in
    /// `llm.api-key-env`; a missing credential is reported per request, not here.
    pub fn from_config(config: &Config) -> std::result::Result<Self, reqwest::Error> {
        let scraper = Scraper::from_config(&config.scraper, &config.user_agent)?;
        let extraction = ExtractionClient::new(reqwest::Client::builder().build()?, config.llm.clone());
        let throttle = Arc::new(MemoryThrottleStore::from_config(&config.throttle));

        Ok(Self::new(
            scraper,
            extraction,
            throttle,
            config.llm.api_key_from_env(),
        ))
    }

    pub fn throttle(&self) -> Arc<dyn ThrottleStore> {
        Arc::clone(&self.throttle)
    }

    /// Enriches a raw JSON request body of the form `{ "company": { ... } }`
    pub async fn enrich(&self, client_id: &str, body: &[u8]) -> Result<EnrichResponse> {
        let (api_key, remaining) = self.admit(client_id)?;

        let request: EnrichRequest = serde_json::from_slice(body)
            .map_err(|_| EnrichError::InvalidRequest("Invalid JSON body.".to_string()))?;
        let company = request.company.unwrap_or_default();

        self.run(api_key, remaining, company).await
    }

    /// Enriches an already-decoded company record
    pub async fn enrich_company(
        &self,
        client_id: &str,
        company: CompanyRecord,
    ) -> Result<EnrichResponse> {
        let (api_key, remaining) = self.admit(client_id)?;
        self.run(api_key, remaining, company).await
    }

    /// Credential check then throttle; returns the key and remaining budget
    fn admit(&self, client_id: &str) -> Result<(&str, u32)> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            EnrichError::Configuration(format!(
                "{} not set",
                self.extraction.config().api_key_env
            ))
        })?;

        let now = Instant::now();
        self.throttle.sweep(now);
        let decision = self.throttle.check(client_id, now);

        if !decision.allowed {
            tracing::info!(client = client_id, wait = ?decision.reset_in, "Throttled enrichment request");
            return Err(EnrichError::ThrottleExceeded {
                retry_after: decision.reset_in,
            });
        }

        Ok((api_key, decision.remaining))
    }

    async fn run(
        &self,
        api_key: &str,
        remaining: u32,
        company: CompanyRecord,
    ) -> Result<EnrichResponse> {
        company.validate()?;

        let scraper = self.scraper.clone();
        let website = company.website.clone();
        let scrape = scrape_isolated(&company.name, async move {
            scraper.scrape_company(&website).await
        })
        .await;

        tracing::info!(
            company = %company.name,
            pages_succeeded = scrape.successful_urls.len(),
            pages_attempted = scrape.attempted_urls.len(),
            chars = scrape.chars_scraped(),
            "Scrape finished"
        );

        let profile = self.extraction.extract(api_key, &company, &scrape).await?;

        Ok(EnrichResponse { profile, remaining })
    }
}

/// Runs a scrape in its own task so that even a panic only costs the content
pub async fn scrape_isolated<F>(company_name: &str, scrape: F) -> ScrapeAggregate
where
    F: Future<Output = ScrapeAggregate> + Send + 'static,
{
    match tokio::spawn(scrape).await {
        Ok(aggregate) => aggregate,
        Err(e) => {
            tracing::error!(company = %company_name, "Scrape failed: {}", e);
            ScrapeAggregate::default()
        }
    }
}
