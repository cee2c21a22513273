use crate::common::{company, enricher, html_page, llm_config, model_json, openai_completion, API_KEY};
use serde_json::json;
use vcscout::config::LlmProvider;
use vcscout::extraction::unreachable_warning;
use vcscout::EnrichError;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_unreachable_site_uses_metadata_prompt() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("could not scrape"))
        .and(body_string_contains("Warehouse picking robots"))
        .respond_with(openai_completion(
            &json!({
                "summary": "Acme likely builds picking robots. Inferred from metadata.",
                "whatTheyDo": ["Picking robots"],
                "keywords": ["robotics"],
                "signals": ["Stage signal (Seed): early"],
                "sources": []
            })
            .to_string(),
        ))
        .expect(1)
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), Some(API_KEY), 5);
    let response = enricher
        .enrich_company("10.0.0.1", company(&site.uri()))
        .await
        .expect("enrichment should succeed");

    let profile = response.profile;
    assert!(profile.sources.is_empty());
    assert_eq!(profile.signals[0], unreachable_warning(&site.uri()));
    assert!(!profile.is_cached);
    assert!(!profile.scrape_stats.had_real_content);
    assert_eq!(profile.scrape_stats.pages_attempted, 9);
    assert_eq!(profile.scrape_stats.pages_succeeded, 0);
    assert_eq!(response.remaining, 4);
}

#[tokio::test]
async fn test_scraped_content_grounds_the_profile() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(html_page(200))
        .mount(&site)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("Real scraped content"))
        .respond_with(openai_completion(&format!("```json\n{}\n```", model_json())))
        .expect(1)
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), Some(API_KEY), 5);
    let profile = enricher
        .enrich_company("10.0.0.1", company(&site.uri()))
        .await
        .expect("enrichment should succeed")
        .profile;

    assert_eq!(profile.summary, "Acme builds picking robots. Warehouses buy them.");
    assert_eq!(profile.sources, vec![format!("{}/blog", site.uri())]);
    assert_eq!(profile.signals, vec!["Blog: shipped v2 last month"]);
    assert!(profile.scrape_stats.had_real_content);
    assert_eq!(profile.scrape_stats.pages_succeeded, 1);
    assert!(profile.scrape_stats.chars_scraped > 100);
}

#[tokio::test]
async fn test_prose_around_json_is_tolerated() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(openai_completion(&format!(
            "Here is the profile you asked for:\n{}\nLet me know if you need more.",
            model_json()
        )))
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), Some(API_KEY), 5);
    let result = enricher.enrich_company("10.0.0.1", company(&site.uri())).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_anthropic_request_shape() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": model_json() }]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::Anthropic, &llm.uri()), Some(API_KEY), 5);
    let result = enricher.enrich_company("10.0.0.1", company(&site.uri())).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_gemini_request_shape() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_string_contains("maxOutputTokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": model_json() }] } }]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::Gemini, &llm.uri()), Some(API_KEY), 5);
    let result = enricher.enrich_company("10.0.0.1", company(&site.uri())).await;

    assert!(result.is_ok());
}

async fn enrich_against_status(provider: LlmProvider, status: u16) -> EnrichError {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string("{\"error\": \"nope\"}"))
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(provider, &llm.uri()), Some(API_KEY), 5);
    enricher
        .enrich_company("10.0.0.1", company(&site.uri()))
        .await
        .expect_err("provider failure should surface")
}

#[tokio::test]
async fn test_provider_status_mapping() {
    assert!(matches!(
        enrich_against_status(LlmProvider::OpenAi, 401).await,
        EnrichError::ProviderAuth { .. }
    ));
    assert!(matches!(
        enrich_against_status(LlmProvider::Gemini, 400).await,
        EnrichError::ProviderAuth { .. }
    ));

    let limited = enrich_against_status(LlmProvider::Anthropic, 429).await;
    assert!(matches!(limited, EnrichError::ProviderRateLimited { .. }));
    assert_eq!(limited.status_code(), 500);

    assert!(matches!(
        enrich_against_status(LlmProvider::OpenAi, 502).await,
        EnrichError::Provider { status: 502, .. }
    ));
}

#[tokio::test]
async fn test_unusable_model_output() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("Acme Robotics"))
        .respond_with(openai_completion("I'm sorry, I cannot help with that."))
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), Some(API_KEY), 5);
    let error = enricher
        .enrich_company("10.0.0.1", company(&site.uri()))
        .await
        .expect_err("unparseable output should fail");
    assert!(matches!(error, EnrichError::ExtractionParse { .. }));
}

#[tokio::test]
async fn test_empty_model_output() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), Some(API_KEY), 5);
    let error = enricher
        .enrich_company("10.0.0.1", company(&site.uri()))
        .await
        .expect_err("empty output should fail");
    assert!(matches!(error, EnrichError::EmptyResponse { .. }));
}

#[tokio::test]
async fn test_missing_credential_skips_all_network() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_page(200))
        .expect(0)
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .respond_with(openai_completion(&model_json()))
        .expect(0)
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), None, 5);
    let error = enricher
        .enrich_company("10.0.0.1", company(&site.uri()))
        .await
        .expect_err("missing credential should fail");

    assert!(matches!(error, EnrichError::Configuration(_)));
}

#[tokio::test]
async fn test_sixth_request_in_window_is_throttled() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(openai_completion(&model_json()))
        .expect(6)
        .mount(&llm)
        .await;

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), Some(API_KEY), 5);

    for expected_remaining in (0..5).rev() {
        let response = enricher
            .enrich_company("203.0.113.7", company(&site.uri()))
            .await
            .expect("request within budget should succeed");
        assert_eq!(response.remaining, expected_remaining);
    }

    let error = enricher
        .enrich_company("203.0.113.7", company(&site.uri()))
        .await
        .expect_err("sixth request should be throttled");
    match error {
        EnrichError::ThrottleExceeded { retry_after } => {
            assert!(retry_after.as_secs() <= 60);
            assert!(!retry_after.is_zero());
        }
        other => panic!("expected throttle error, got {}", other),
    }

    // Other clients have their own budget
    assert!(enricher
        .enrich_company("198.51.100.1", company(&site.uri()))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_transport_errors_never_expose_query_key() {
    let site = MockServer::start().await;
    let secret = "gemini-secret-7f3a";

    // Nothing listens on the discard port
    let enricher = enricher(llm_config(LlmProvider::Gemini, "http://127.0.0.1:9"), Some(secret), 5);
    let error = enricher
        .enrich_company("10.0.0.1", company(&site.uri()))
        .await
        .expect_err("unreachable provider should fail");

    assert!(matches!(error, EnrichError::ProviderTransport { .. }));
    assert_eq!(error.status_code(), 500);
    assert!(!error.to_string().contains(secret));
    assert!(!format!("{:?}", error).contains(secret));

    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        assert!(!cause.to_string().contains(secret));
        source = std::error::Error::source(cause);
    }
}

#[tokio::test]
async fn test_null_metadata_fields_are_accepted() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(openai_completion(
            &json!({ "summary": "Acme, inferred from its name alone." }).to_string(),
        ))
        .expect(1)
        .mount(&llm)
        .await;

    let body = json!({
        "company": {
            "name": "Acme",
            "website": site.uri(),
            "description": null,
            "sector": null,
            "stage": null,
            "tags": null
        }
    })
    .to_string();

    let enricher = enricher(llm_config(LlmProvider::OpenAi, &llm.uri()), Some(API_KEY), 5);
    let response = enricher
        .enrich("10.0.0.1", body.as_bytes())
        .await
        .expect("null metadata should read as empty");

    assert_eq!(response.profile.summary, "Acme, inferred from its name alone.");
    assert_eq!(response.profile.signals[0], unreachable_warning(&site.uri()));
}
