use crate::pipeline::Enricher;
use crate::{retry_after_secs, EnrichError};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// Identity used for throttling
///
/// Priority:
/// 1. First entry of X-Forwarded-For
/// 2. X-Real-IP
/// 3. `"unknown"`
pub fn client_identity(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// `POST /api/enrich`
pub async fn enrich(
    State(enricher): State<Arc<Enricher>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client = client_identity(&headers);

    match enricher.enrich(&client, &body).await {
        Ok(response) => (
            StatusCode::OK,
            [(RATE_LIMIT_REMAINING, response.remaining.to_string())],
            Json(json!({ "result": response.profile })),
        )
            .into_response(),
        Err(e) => error_response(&client, &e),
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn error_response(client: &str, error: &EnrichError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        tracing::error!(client, "Enrichment failed: {}", error);
    } else {
        tracing::debug!(client, status = status.as_u16(), "Rejected request: {}", error);
    }

    let mut response = (status, Json(json!({ "error": error.to_string() }))).into_response();

    if let Some(wait) = error.retry_after() {
        let headers = response.headers_mut();
        headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs(wait)));
        headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
    }

    response
}
