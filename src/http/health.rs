// Liveness endpoints for hosting platforms that ping the process over HTTP.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::time::Instant;

/// Linux reports resident memory in pages; every target we deploy to uses 4 KiB.
const PAGE_SIZE: u64 = 4096;

#[derive(Clone)]
pub struct HealthState {
    started: Instant,
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct MemoryBody {
    pub rss_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub memory: MemoryBody,
    pub timestamp: String,
}

pub fn router(started: Instant) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(HealthState { started })
}

/// Bind `0.0.0.0:port` and serve until the process exits.
pub async fn serve(port: u16, started: Instant) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Health server listening");
    axum::serve(listener, router(started)).await
}

async fn root(State(state): State<HealthState>) -> Json<StatusBody> {
    Json(StatusBody {
        status: "Bot is running!",
        uptime_secs: state.started.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn health(State(state): State<HealthState>) -> Json<HealthBody> {
    let rss_bytes = std::fs::read_to_string("/proc/self/statm")
        .ok()
        .and_then(|statm| rss_from_statm(&statm));

    Json(HealthBody {
        status: "healthy",
        uptime_secs: state.started.elapsed().as_secs(),
        memory: MemoryBody { rss_bytes },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Second column of `/proc/self/statm` is the resident set in pages.
fn rss_from_statm(statm: &str) -> Option<u64> {
    statm
        .split_whitespace()
        .nth(1)?
        .parse::<u64>()
        .ok()
        .map(|pages| pages * PAGE_SIZE)
}
