use crate::common::{enricher, html_page, llm_config, model_json, openai_completion, API_KEY};
use serde_json::{json, Value};
use std::sync::Arc;
use vcscout::config::LlmProvider;
use vcscout::server::router;
use vcscout::Enricher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

/// Serves the router on an ephemeral port and returns its base URL
async fn spawn_app(enricher: Enricher) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(listener, router(Arc::new(enricher)))
            .await
            .expect("Server failed");
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_enrich_over_http() {
    let site = MockServer::start().await;
    let llm = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page(500))
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .respond_with(openai_completion(&model_json()))
        .mount(&llm)
        .await;

    let app = spawn_app(enricher(
        llm_config(LlmProvider::OpenAi, &llm.uri()),
        Some(API_KEY),
        5,
    ))
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/enrich", app))
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .json(&json!({
            "company": {
                "id": "c-42",
                "name": "Acme Robotics",
                "website": site.uri(),
                "sector": "Robotics",
                "stage": "Seed",
                "score": 91
            }
        }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");

    let body: Value = response.json().await.expect("body was not JSON");
    let result = &body["result"];
    assert_eq!(result["isCached"], false);
    assert_eq!(result["sources"], json!([format!("{}/about", site.uri())]));
    assert_eq!(result["scrapeStats"]["pagesAttempted"], 9);
    assert_eq!(result["scrapeStats"]["pagesSucceeded"], 1);
    assert!(result["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_throttled_over_http() {
    let app = spawn_app(enricher(
        llm_config(LlmProvider::OpenAi, "http://127.0.0.1:9"),
        Some(API_KEY),
        2,
    ))
    .await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let response = client
            .post(format!("{}/api/enrich", app))
            .header("x-real-ip", "198.51.100.9")
            .body("{}")
            .send()
            .await
            .expect("request failed");
        assert_eq!(response.status(), 400);
    }

    let response = client
        .post(format!("{}/api/enrich", app))
        .header("x-real-ip", "198.51.100.9")
        .body("{}")
        .send()
        .await
        .expect("request failed");

    assert_eq!(response.status(), 429);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        format!("Rate limit exceeded. Try again in {}s.", retry_after)
    );
}

#[tokio::test]
async fn test_missing_fields_over_http() {
    let app = spawn_app(enricher(
        llm_config(LlmProvider::OpenAi, "http://127.0.0.1:9"),
        Some(API_KEY),
        5,
    ))
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/enrich", app))
        .json(&json!({ "company": { "name": "No Website Inc" } }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields: name, website.");
}

#[tokio::test]
async fn test_health_over_http() {
    let app = spawn_app(enricher(
        llm_config(LlmProvider::OpenAi, "http://127.0.0.1:9"),
        None,
        5,
    ))
    .await;

    let body: Value = reqwest::get(format!("{}/health", app))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_provider_failure_body_hides_credential() {
    let site = MockServer::start().await;
    let secret = "gemini-secret-7f3a";

    let app = spawn_app(enricher(
        llm_config(LlmProvider::Gemini, "http://127.0.0.1:9"),
        Some(secret),
        5,
    ))
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/enrich", app))
        .json(&json!({ "company": { "name": "Acme", "website": site.uri() } }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(body.contains("Gemini request failed"));
    assert!(!body.contains(secret));
}
