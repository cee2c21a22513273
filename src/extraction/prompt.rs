//! Prompt construction
//!
//! Pure functions of their inputs: no I/O, so both variants are easy to test.

use super::CompanyRecord;
use crate::scrape::ScrapeAggregate;

/// Builds the extraction prompt
///
/// With `has_content` the model is told to ground every field in the scraped
/// text and `sources` is pre-filled with the URLs that produced it. Without,
/// the model works from metadata only and must say so in `signals`.
pub fn build_prompt(has_content: bool, company: &CompanyRecord, scrape: &ScrapeAggregate) -> String {
    if has_content {
        real_content_prompt(company, scrape)
    } else {
        metadata_only_prompt(company)
    }
}

fn real_content_prompt(company: &CompanyRecord, scrape: &ScrapeAggregate) -> String {
    let sources = serde_json::to_string(&scrape.successful_urls).unwrap_or_else(|_| "[]".into());

    format!(
        r#"You are a VC research analyst. I scraped {pages} pages from {name}'s website. Build a structured enrichment profile from this REAL content. Every field must come from the scraped text below, not from general knowledge.

Company metadata:
- Name: {name}
- Website: {website}
- Sector: {sector}
- Stage: {stage}
- Tags: {tags}

Real scraped content:
{content}

Respond with ONLY a valid JSON object. No markdown fences, no explanation, nothing before or after the JSON:
{{
  "summary": "Two crisp sentences: what they build according to the scraped text, and who buys it",
  "whatTheyDo": [
    "Core product capability, from the scraped text",
    "Primary differentiator stated on the site",
    "Customer segment or use case named on the site",
    "Go-to-market motion visible on the site (PLG / sales-led / channel)",
    "Integration or ecosystem angle visible on the site"
  ],
  "keywords": ["kw1", "kw2", "kw3", "kw4", "kw5", "kw6", "kw7", "kw8"],
  "signals": [
    "Careers: open roles and departments (from scraped data)",
    "Blog: recency and topic of the latest post (from scraped data)",
    "Changelog: shipping cadence (from scraped data)",
    "Homepage: social proof, customer logos, or traction metrics (from scraped data)"
  ],
  "sources": {sources}
}}"#,
        pages = scrape.successful_urls.len(),
        name = company.name,
        website = company.website,
        sector = company.sector,
        stage = company.stage,
        tags = company.tags.join(", "),
        content = scrape.scraped_text,
        sources = sources,
    )
}

fn metadata_only_prompt(company: &CompanyRecord) -> String {
    let founded = company
        .founded
        .map(|year| year.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        r#"You are a VC research analyst. I could not scrape {name}'s website: every page was blocked or unreachable. Infer the best profile you can strictly from the metadata below, and flag clearly in signals that nothing was observed on the site.

Company: {name}
Website: {website}
Description: {description}
Sector: {sector}
Stage: {stage}
Tags: {tags}
Founded: {founded}

Respond with ONLY a valid JSON object. No markdown fences, no explanation:
{{
  "summary": "Two crisp sentences based on the available metadata only",
  "whatTheyDo": [
    "Core product capability inferred from the description",
    "Likely differentiator given sector and tags",
    "Target customer segment inferred from metadata",
    "Go-to-market motion typical for this stage and sector",
    "Ecosystem angle common in this space"
  ],
  "keywords": ["kw1", "kw2", "kw3", "kw4", "kw5", "kw6", "kw7", "kw8"],
  "signals": [
    "{warning}",
    "Stage signal ({stage}): typical velocity for this stage",
    "Sector signal ({sector}): competitive dynamics inferred",
    "Re-run enrichment when the site becomes accessible for real signals"
  ],
  "sources": []
}}"#,
        name = company.name,
        website = company.website,
        description = company.description,
        sector = company.sector,
        stage = company.stage,
        tags = company.tags.join(", "),
        founded = founded,
        warning = unreachable_warning(&company.website),
    )
}

/// Signal that marks a profile as inferred rather than observed
pub fn unreachable_warning(website: &str) -> String {
    format!(
        "Warning: {} was not accessible; signals are inferred, not scraped",
        website
    )
}
