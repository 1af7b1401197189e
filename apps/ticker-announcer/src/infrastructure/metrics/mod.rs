//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics
//!
//! - `ticker_ticks_total`: fetch/announce cycles attempted
//! - `ticker_fetch_failures_total`: price fetches that failed
//! - `ticker_stale_observations_total`: results discarded by the
//!   generation check
//! - `ticker_events_broadcast_total`: events delivered to sessions
//! - `ticker_sessions_active`: currently connected sessions
//!
//! Metrics are exposed at `/metrics` on the main server port.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

fn register_metrics() {
    describe_counter!(
        "ticker_ticks_total",
        "Total fetch/announce cycles attempted"
    );
    describe_counter!(
        "ticker_fetch_failures_total",
        "Total price fetches that failed"
    );
    describe_counter!(
        "ticker_stale_observations_total",
        "Total fetch results discarded by the generation check"
    );
    describe_counter!(
        "ticker_events_broadcast_total",
        "Total events delivered to sessions"
    );
    describe_gauge!("ticker_sessions_active", "Currently connected sessions");
}

/// Record one scheduled tick.
pub fn record_tick() {
    counter!("ticker_ticks_total").increment(1);
}

/// Record a failed price fetch.
pub fn record_fetch_failure() {
    counter!("ticker_fetch_failures_total").increment(1);
}

/// Record a fetch result discarded as stale.
pub fn record_stale_observation() {
    counter!("ticker_stale_observations_total").increment(1);
}

/// Record an event broadcast delivered to `receivers` sessions.
pub fn record_broadcast(receivers: usize) {
    counter!("ticker_events_broadcast_total").increment(receivers as u64);
}

/// Record a session connect.
pub fn session_connected() {
    gauge!("ticker_sessions_active").increment(1.0);
}

/// Record a session disconnect.
pub fn session_disconnected() {
    gauge!("ticker_sessions_active").decrement(1.0);
}
