//! Ticker Announcer Binary
//!
//! Starts the shared ticker broadcast server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin ticker-announcer
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `TICKER_ANNOUNCER_PORT`: HTTP/WebSocket listen port (default: 5000)
//! - `TICKER_DEFAULT_INTERVAL_SECS`: interval when a start command omits one (default: 300)
//! - `TICKER_MIN_INTERVAL_SECS`: interval floor (default: 5)
//! - `TICKER_EVENTS_CAPACITY`: broadcast channel capacity (default: 256)
//! - `TICKER_QUOTE_BASE_URL`: quote API base URL
//! - `TICKER_QUOTE_TIMEOUT_SECS`: quote API request timeout (default: 10)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: ticker-announcer)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use ticker_announcer::infrastructure::{health, telemetry, ws};
use ticker_announcer::{
    AnnouncerConfig, BroadcastHub, HealthState, PollingScheduler, PriceSource, TickerStore,
    WsState, YahooPriceSource, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
#[allow(clippy::expect_used)]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Ticker Announcer");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = AnnouncerConfig::from_env();
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Core wiring: one store, one hub, one scheduler per process
    let hub = Arc::new(BroadcastHub::new(config.broadcast.events_capacity));
    let store = Arc::new(TickerStore::new(config.ticker.min_interval_seconds));
    let source: Arc<dyn PriceSource> = Arc::new(YahooPriceSource::new(&config.quotes)?);
    let scheduler = Arc::new(PollingScheduler::new(
        Arc::clone(&store),
        source,
        Arc::clone(&hub),
    ));

    let ws_state = WsState {
        scheduler: Arc::clone(&scheduler),
        store: Arc::clone(&store),
        hub: Arc::clone(&hub),
        default_interval_seconds: config.ticker.default_interval_seconds,
    };
    let health_state = Arc::new(HealthState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&store),
        Arc::clone(&hub),
    ));

    let app = Router::new()
        .merge(ws::router(ws_state))
        .merge(health::router(health_state));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "server listening");

    let serve_shutdown = shutdown_token.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { serve_shutdown.cancelled().await })
            .await
        {
            tracing::error!(error = %e, "server error");
        }
        tracing::info!("server stopped");
    });

    tracing::info!("Ticker announcer ready");

    await_shutdown(shutdown_token).await;

    // Cancel the active schedule; sessions are going away with the server
    scheduler.shutdown();
    let _ = server.await;

    tracing::info!("Ticker announcer stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &AnnouncerConfig) {
    tracing::info!(
        port = config.server.port,
        default_interval_secs = config.ticker.default_interval_seconds,
        min_interval_secs = config.ticker.min_interval_seconds,
        events_capacity = config.broadcast.events_capacity,
        "Configuration loaded"
    );
    tracing::debug!(
        quote_base_url = %config.quotes.base_url,
        quote_timeout_secs = config.quotes.timeout.as_secs(),
        "Quote API endpoint"
    );
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
