//! Completion endpoint integration
//!
//! The one place that knows how each supported provider wants its request
//! shaped, how it authenticates, where the generated text sits in its
//! response envelope, and what its error statuses mean.

use crate::config::{LlmConfig, LlmProvider};
use crate::EnrichError;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use url::Url;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Builds the completion request for the configured provider
pub fn completion_request(
    http: &Client,
    config: &LlmConfig,
    api_key: &str,
    prompt: &str,
) -> Result<RequestBuilder, EnrichError> {
    let url = endpoint_url(config, api_key)?;

    let request = match config.provider {
        LlmProvider::OpenAi => http.post(url).bearer_auth(api_key).json(&json!({
            "model": config.model(),
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": config.temperature,
            "max_tokens": config.max_output_tokens,
        })),
        LlmProvider::Anthropic => http
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": config.model(),
                "max_tokens": config.max_output_tokens,
                "temperature": config.temperature,
                "messages": [{ "role": "user", "content": prompt }],
            })),
        LlmProvider::Gemini => http.post(url).json(&json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": config.temperature,
                "maxOutputTokens": config.max_output_tokens,
            },
        })),
    };

    Ok(request)
}

/// Full endpoint URL; Gemini carries the key as a query parameter
fn endpoint_url(config: &LlmConfig, api_key: &str) -> Result<Url, EnrichError> {
    let base = config.base_url().trim_end_matches('/');

    let raw = match config.provider {
        LlmProvider::OpenAi => format!("{}/v1/chat/completions", base),
        LlmProvider::Anthropic => format!("{}/v1/messages", base),
        LlmProvider::Gemini => format!("{}/v1beta/models/{}:generateContent", base, config.model()),
    };

    let mut url = Url::parse(&raw).map_err(|e| {
        EnrichError::Configuration(format!("invalid LLM endpoint '{}': {}", raw, e))
    })?;

    if config.provider == LlmProvider::Gemini {
        url.query_pairs_mut().append_pair("key", api_key);
    }

    Ok(url)
}

/// Extracts the generated text from a provider response envelope
pub fn response_text(provider: LlmProvider, envelope: &Value) -> Option<&str> {
    let pointer = match provider {
        LlmProvider::OpenAi => "/choices/0/message/content",
        LlmProvider::Anthropic => "/content/0/text",
        LlmProvider::Gemini => "/candidates/0/content/parts/0/text",
    };

    envelope
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

/// Maps a non-success status from the provider to a caller-facing error
///
/// Gemini rejects unknown keys with 400, the others with 401/403.
pub fn status_error(provider: LlmProvider, status: u16) -> EnrichError {
    let name = provider.display_name();

    match (provider, status) {
        (_, 401 | 403) | (LlmProvider::Gemini, 400) => EnrichError::ProviderAuth { provider: name },
        (_, 429) => EnrichError::ProviderRateLimited { provider: name },
        _ => EnrichError::Provider {
            provider: name,
            status,
        },
    }
}
