//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port
//! interfaces defined in the application layer, plus the transport and
//! observability surfaces.

/// Broadcast channel and wire event types.
pub mod broadcast;

/// Configuration loading.
pub mod config;

/// Health check and metrics HTTP endpoints.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Price source adapters (Yahoo Finance, mock).
pub mod price_source;

/// OpenTelemetry tracing integration.
pub mod telemetry;

/// WebSocket session server.
pub mod ws;
