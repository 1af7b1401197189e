//! Announcer Configuration Settings
//!
//! Configuration types for the service, loaded from environment
//! variables. Every knob has a default; nothing is required.

use std::time::Duration;

use crate::domain::ticker::DEFAULT_MIN_INTERVAL_SECONDS;
use crate::infrastructure::broadcast::DEFAULT_EVENTS_CAPACITY;
use crate::infrastructure::price_source::yahoo::DEFAULT_BASE_URL;

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// HTTP/WebSocket listen port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

/// Ticker cadence settings.
#[derive(Debug, Clone)]
pub struct TickerSettings {
    /// Interval applied when a start command omits one, in seconds.
    pub default_interval_seconds: u64,
    /// Floor below which start commands are rejected, in seconds.
    pub min_interval_seconds: u64,
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self {
            default_interval_seconds: 300,
            min_interval_seconds: DEFAULT_MIN_INTERVAL_SECONDS,
        }
    }
}

/// Broadcast channel settings.
#[derive(Debug, Clone)]
pub struct BroadcastSettings {
    /// Capacity of the server event channel.
    pub events_capacity: usize,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            events_capacity: DEFAULT_EVENTS_CAPACITY,
        }
    }
}

/// Quote API client settings.
#[derive(Debug, Clone)]
pub struct QuoteApiSettings {
    /// Base URL of the quote endpoint.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for QuoteApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default)]
pub struct AnnouncerConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Ticker cadence settings.
    pub ticker: TickerSettings,
    /// Broadcast channel settings.
    pub broadcast: BroadcastSettings,
    /// Quote API client settings.
    pub quotes: QuoteApiSettings,
}

impl AnnouncerConfig {
    /// Create configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let server = ServerSettings {
            port: parse_env_u16("TICKER_ANNOUNCER_PORT", ServerSettings::default().port),
        };

        let ticker = TickerSettings {
            default_interval_seconds: parse_env_u64(
                "TICKER_DEFAULT_INTERVAL_SECS",
                TickerSettings::default().default_interval_seconds,
            ),
            min_interval_seconds: parse_env_u64(
                "TICKER_MIN_INTERVAL_SECS",
                TickerSettings::default().min_interval_seconds,
            ),
        };

        let broadcast = BroadcastSettings {
            events_capacity: parse_env_usize(
                "TICKER_EVENTS_CAPACITY",
                BroadcastSettings::default().events_capacity,
            ),
        };

        let quotes = QuoteApiSettings {
            base_url: std::env::var("TICKER_QUOTE_BASE_URL")
                .unwrap_or_else(|_| QuoteApiSettings::default().base_url),
            timeout: parse_env_duration_secs(
                "TICKER_QUOTE_TIMEOUT_SECS",
                QuoteApiSettings::default().timeout,
            ),
        };

        Self {
            server,
            ticker,
            broadcast,
            quotes,
        }
    }
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}
