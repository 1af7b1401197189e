//! Health Check and Metrics Endpoints
//!
//! HTTP endpoints for health checks, ticker status reporting, and
//! Prometheus metrics. Used by container orchestrators, load balancers,
//! and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status with the ticker snapshot
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe
//! - `GET /metrics` - Prometheus metrics in text format

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::ticker::TickerStore;
use crate::infrastructure::broadcast::SharedBroadcastHub;
use crate::infrastructure::metrics::get_metrics_handle;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status; this service has no upstream connection to
    /// degrade on, so it reports healthy while it can answer at all.
    pub status: &'static str,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Connected session count.
    pub sessions: usize,
    /// Shared ticker status.
    pub ticker: TickerStatus,
}

/// Shared ticker status as reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct TickerStatus {
    /// Whether a polling schedule is active.
    pub running: bool,
    /// Currently selected symbol.
    pub symbol: Option<String>,
    /// Cadence of the current generation, in seconds.
    pub interval_seconds: u64,
    /// Current generation counter.
    pub generation: u64,
    /// Last accepted price.
    pub last_price: Option<Decimal>,
    /// Time of the last accepted observation.
    pub last_updated: Option<DateTime<Utc>>,
}

// =============================================================================
// Health State and Router
// =============================================================================

/// Shared state for the health endpoints.
pub struct HealthState {
    version: String,
    started_at: Instant,
    store: Arc<TickerStore>,
    hub: SharedBroadcastHub,
}

impl HealthState {
    /// Create new health state.
    #[must_use]
    pub fn new(version: String, store: Arc<TickerStore>, hub: SharedBroadcastHub) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            store,
            hub,
        }
    }
}

/// Build the health/metrics router.
pub fn router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn health(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot();
    Json(HealthResponse {
        status: "healthy",
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        sessions: state.hub.session_count(),
        ticker: TickerStatus {
            running: snapshot.running,
            symbol: snapshot.symbol.map(|s| s.into_inner()),
            interval_seconds: snapshot.interval_seconds,
            generation: snapshot.generation,
            last_price: snapshot.last_price,
            last_updated: snapshot.last_updated,
        },
    })
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz() -> &'static str {
    "ready"
}

async fn metrics() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || (StatusCode::SERVICE_UNAVAILABLE, String::new()).into_response(),
        |handle| handle.render().into_response(),
    )
}

// =============================================================================
// Tests
// =============================================================================
