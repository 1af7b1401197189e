#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Ticker Announcer - Shared Ticker Broadcast Engine
//!
//! A WebSocket service that owns one global ticker subscription (symbol
//! + interval), polls a market data source on a schedule, and fans the
//! resulting price announcements out to every connected session.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: The shared ticker state machine and formatting
//!   - `ticker`: Symbol, TickerState, TickerStore, generations
//!   - `announcement`: price -> announcement sentence
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The PriceSource interface
//!   - `services`: The PollingScheduler
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `broadcast`: Wire events and the fan-out hub
//!   - `ws`: WebSocket session server
//!   - `price_source`: Yahoo Finance and mock adapters
//!   - `config`: Configuration loading
//!   - `health`: Health check HTTP endpoints
//!
//! # Data Flow
//!
//! ```text
//!                    tick           accepted
//! Quote API <------ fetch ------+------------+
//!                               |            |
//!                   PollingScheduler    TickerStore
//!                               |
//!                        +------v------+     +-----------+--> Session 1
//!                        |  Broadcast  |---->| WebSocket |--> Session 2
//!                        |     Hub     |     |  Server   |--> Session N
//!                        +-------------+     +-----------+
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core ticker state with no transport dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::announcement::announcement_text;
pub use domain::ticker::{
    DEFAULT_MIN_INTERVAL_SECONDS, StartedTicker, Symbol, TickerError, TickerState, TickerStore,
};

// Application ports and services
pub use application::ports::{PriceSource, PriceSourceError};
pub use application::services::PollingScheduler;

// Broadcast hub and wire events (for integration tests)
pub use infrastructure::broadcast::{
    BroadcastHub, ClientCommand, DEFAULT_EVENTS_CAPACITY, ServerEvent, SharedBroadcastHub,
};

// Infrastructure config
pub use infrastructure::config::{
    AnnouncerConfig, BroadcastSettings, QuoteApiSettings, ServerSettings, TickerSettings,
};

// Price source adapters
pub use infrastructure::price_source::{MockPriceSource, YahooPriceSource};

// Health endpoints
pub use infrastructure::health::{HealthResponse, HealthState, TickerStatus};

// WebSocket server
pub use infrastructure::ws::WsState;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
