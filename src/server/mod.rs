//! HTTP surface
//!
//! Exposes the pipeline as `POST /api/enrich` and a liveness check at
//! `GET /health`. While serving, a background task sweeps stale throttle
//! buckets so idle clients do not accumulate.

mod handlers;

pub use handlers::client_identity;

use crate::pipeline::Enricher;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builds the application router
pub fn router(enricher: Arc<Enricher>) -> Router {
    Router::new()
        .route("/api/enrich", post(handlers::enrich))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(enricher)
}

/// Serves until Ctrl-C
pub async fn serve(
    enricher: Arc<Enricher>,
    bind: &str,
    sweep_interval: Duration,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let sweeper = spawn_sweeper(&enricher, sweep_interval);

    let result = axum::serve(listener, router(enricher))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    result
}

fn spawn_sweeper(enricher: &Enricher, period: Duration) -> tokio::task::JoinHandle<()> {
    let throttle = enricher.throttle();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = throttle.sweep(Instant::now());
            if removed > 0 {
                tracing::debug!(removed, remaining = throttle.len(), "Swept throttle buckets");
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
