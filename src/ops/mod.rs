//! Operational API.
//!
//! A small HTTP surface for operators: liveness, a JSON status snapshot of
//! the fleet and recent cycles, and Prometheus metrics. This is the daemon's
//! own control surface; worker traffic never passes through it.

use crate::control::{CycleLog, CyclePhase, CycleReport};
use crate::fleet::{Fleet, WorkerView};
use crate::metrics::PrometheusHandle;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared state behind the operational API.
pub struct AppState {
    pub fleet: Arc<Fleet>,
    pub cycle_log: Arc<CycleLog>,
    pub phase: Arc<RwLock<CyclePhase>>,
    pub started_at: Instant,
    pub prometheus: PrometheusHandle,
}

/// Payload of `GET /v1/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub phase: CyclePhase,
    pub workers: Vec<WorkerView>,
    /// Recent cycle reports, newest first
    pub cycles: Vec<CycleReport>,
}

/// Build the operational API router.
pub fn router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/status", get(status))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let phase = state
        .phase
        .read()
        .map(|p| *p)
        .unwrap_or(CyclePhase::Idle);

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        phase,
        workers: state.fleet.snapshot(),
        cycles: state.cycle_log.recent(16),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus.render(),
    )
}
