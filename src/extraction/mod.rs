//! Language-model extraction of company profiles
//!
//! Turns a [`ScrapeAggregate`] plus company metadata into an
//! [`EnrichmentProfile`]:
//! - Picks the real-content or metadata-only prompt
//! - Calls the configured completion endpoint
//! - Decodes the model's JSON leniently
//! - Attaches timestamp and scrape statistics

mod parse;
mod prompt;
mod provider;

pub use parse::{find_json_object, parse_lenient, strip_code_fences};
pub use prompt::{build_prompt, unreachable_warning};
pub use provider::{completion_request, response_text, status_error};

use crate::config::LlmConfig;
use crate::scrape::ScrapeAggregate;
use crate::EnrichError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Company metadata supplied by the dashboard
///
/// Only `name` and `website` are required; other dashboard fields are ignored.
/// A field sent as `null` reads the same as a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sector: String,
    #[serde(deserialize_with = "null_as_default")]
    pub stage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub founded: Option<i32>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CompanyRecord {
    /// Checks the fields the pipeline cannot work without
    pub fn validate(&self) -> Result<(), EnrichError> {
        if self.name.trim().is_empty() || self.website.trim().is_empty() {
            return Err(EnrichError::InvalidRequest(
                "Missing required fields: name, website.".to_string(),
            ));
        }
        Ok(())
    }
}

/// What was fetched while building a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeStats {
    pub pages_attempted: usize,
    pub pages_succeeded: usize,
    pub chars_scraped: usize,
    pub had_real_content: bool,
}

/// Structured company profile returned to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentProfile {
    pub summary: String,
    pub what_they_do: Vec<String>,
    pub keywords: Vec<String>,
    pub signals: Vec<String>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
    /// Always false when produced here; the caller marks cached copies
    pub is_cached: bool,
    pub scrape_stats: ScrapeStats,
}

/// Fields the model is asked to produce
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfile {
    pub summary: String,
    #[serde(default)]
    pub what_they_do: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub signals: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Calls the completion endpoint and assembles profiles
#[derive(Debug, Clone)]
pub struct ExtractionClient {
    http: Client,
    config: LlmConfig,
}

impl ExtractionClient {
    pub fn new(http: Client, config: LlmConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Whether the scraped text is substantial enough to ground the profile
    pub fn has_real_content(&self, scrape: &ScrapeAggregate) -> bool {
        scrape.chars_scraped() > self.config.real_content_threshold
    }

    /// Produces a profile for `company` from whatever `scrape` found
    pub async fn extract(
        &self,
        api_key: &str,
        company: &CompanyRecord,
        scrape: &ScrapeAggregate,
    ) -> Result<EnrichmentProfile, EnrichError> {
        let has_content = self.has_real_content(scrape);
        let prompt = build_prompt(has_content, company, scrape);

        tracing::debug!(
            company = %company.name,
            has_content,
            prompt_chars = prompt.len(),
            "Requesting extraction"
        );

        let raw = self.complete(api_key, &prompt).await?;
        let parsed: ModelProfile = parse_lenient(&raw).ok_or(EnrichError::ExtractionParse {
            provider: self.provider_name(),
        })?;

        Ok(assemble_profile(parsed, company, scrape, has_content, Utc::now()))
    }

    /// Sends the prompt and returns the model's raw text output
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, EnrichError> {
        let provider = self.config.provider;
        // Gemini carries the key in the query string, so the URL must not
        // reach error messages
        let transport = |source: reqwest::Error| EnrichError::ProviderTransport {
            provider: provider.display_name(),
            source: source.without_url(),
        };

        let response = completion_request(&self.http, &self.config, api_key, prompt)?
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                provider = provider.display_name(),
                status = status.as_u16(),
                "Completion request rejected: {}",
                body
            );
            return Err(status_error(provider, status.as_u16()));
        }

        let envelope: Value = response.json().await.map_err(transport)?;

        response_text(provider, &envelope)
            .map(str::to_string)
            .ok_or(EnrichError::EmptyResponse {
                provider: provider.display_name(),
            })
    }

    fn provider_name(&self) -> &'static str {
        self.config.provider.display_name()
    }
}

/// Merges the model's fields with pipeline-owned metadata
///
/// `sources` always reflects the pages actually used, whatever the model
/// echoed back. Metadata-only profiles always carry an unreachable warning.
pub fn assemble_profile(
    parsed: ModelProfile,
    company: &CompanyRecord,
    scrape: &ScrapeAggregate,
    had_real_content: bool,
    timestamp: DateTime<Utc>,
) -> EnrichmentProfile {
    let mut signals = parsed.signals;
    let sources = if had_real_content {
        scrape.successful_urls.clone()
    } else {
        let flagged = signals.iter().any(|signal| {
            let lower = signal.to_lowercase();
            lower.contains("not accessible") || lower.contains("unreachable")
        });
        if !flagged {
            signals.insert(0, unreachable_warning(&company.website));
        }
        Vec::new()
    };

    EnrichmentProfile {
        summary: parsed.summary,
        what_they_do: parsed.what_they_do,
        keywords: parsed.keywords,
        signals,
        sources,
        timestamp,
        is_cached: false,
        scrape_stats: ScrapeStats {
            pages_attempted: scrape.attempted_urls.len(),
            pages_succeeded: scrape.successful_urls.len(),
            chars_scraped: scrape.chars_scraped(),
            had_real_content,
        },
    }
}
