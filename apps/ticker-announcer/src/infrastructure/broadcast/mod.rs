//! Broadcast Channel and Wire Events
//!
//! Implements event distribution using a tokio broadcast channel for
//! efficient fan-out to every connected session, plus the JSON event
//! types carried over the WebSocket boundary.
//!
//! # Architecture
//!
//! The `BroadcastHub` owns one channel of [`ServerEvent`]s. Each session
//! subscribes on connect; dropping the receiver on disconnect removes
//! the session from the registry, so removal is idempotent by
//! construction. A slow or disconnecting session only affects its own
//! receiver, never delivery to the others.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::domain::ticker::Symbol;

/// Default capacity of the event channel.
pub const DEFAULT_EVENTS_CAPACITY: usize = 256;

// =============================================================================
// Wire Events
// =============================================================================

/// Event published by the server to every session.
///
/// Serialized as `{"event": <name>, "data": <payload>}` with camelCase
/// payload keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Session acknowledgment, sent point-to-point on connect.
    Connected {
        /// Human-readable status line.
        status: String,
    },
    /// The shared ticker (re)started.
    Started {
        /// Normalized symbol.
        symbol: String,
        /// Polling cadence in seconds.
        interval_seconds: u64,
    },
    /// The shared ticker stopped.
    Stopped {},
    /// One accepted price observation.
    PriceUpdate {
        /// Normalized symbol.
        symbol: String,
        /// Price in dollars.
        price: f64,
        /// Ready-to-render announcement sentence.
        announcement: String,
        /// Observation time, epoch seconds.
        timestamp: i64,
    },
    /// A command was rejected or a fetch failed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl ServerEvent {
    /// The connect acknowledgment.
    #[must_use]
    pub fn connected() -> Self {
        Self::Connected {
            status: "Connected to server".to_string(),
        }
    }

    /// A `started` event for the given ticker.
    #[must_use]
    pub fn started(symbol: &Symbol, interval_seconds: u64) -> Self {
        Self::Started {
            symbol: symbol.as_str().to_string(),
            interval_seconds,
        }
    }

    /// The `stopped` event.
    #[must_use]
    pub const fn stopped() -> Self {
        Self::Stopped {}
    }

    /// A `price_update` event for one accepted observation.
    #[must_use]
    pub fn price_update(
        symbol: &Symbol,
        price: Decimal,
        announcement: String,
        at: DateTime<Utc>,
    ) -> Self {
        Self::PriceUpdate {
            symbol: symbol.as_str().to_string(),
            price: decimal_to_f64(price),
            announcement,
            timestamp: at.timestamp(),
        }
    }

    /// An `error` event with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Command received from a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientCommand {
    /// Request to (re)start the shared ticker.
    StartAnnouncements {
        /// Requested symbol, normalized by the store.
        symbol: String,
        /// Polling cadence in seconds; the configured default applies
        /// when omitted.
        #[serde(default)]
        interval_seconds: Option<u64>,
    },
    /// Request to stop the shared ticker.
    StopAnnouncements,
}

/// Decimal prices live in the domain; the wire carries plain numbers.
fn decimal_to_f64(d: Decimal) -> f64 {
    use std::str::FromStr;
    f64::from_str(&d.to_string()).unwrap_or(0.0)
}

// =============================================================================
// Broadcast Hub
// =============================================================================

/// Central fan-out hub for server events.
///
/// # Example
///
/// ```rust
/// use ticker_announcer::infrastructure::broadcast::{BroadcastHub, ServerEvent};
///
/// let hub = BroadcastHub::with_defaults();
/// let mut rx = hub.subscribe();
///
/// hub.publish(ServerEvent::connected());
/// ```
#[derive(Debug)]
pub struct BroadcastHub {
    events_tx: broadcast::Sender<ServerEvent>,
}

impl BroadcastHub {
    /// Create a hub with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            events_tx: broadcast::channel(capacity).0,
        }
    }

    /// Create a hub with the default capacity.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_EVENTS_CAPACITY)
    }

    /// Publish an event to every currently registered session.
    ///
    /// Returns the number of sessions that received the event, or
    /// `None` when no sessions are connected. Delivery to zero sessions
    /// is never an error: the shared ticker survives regardless of how
    /// many clients are listening.
    pub fn publish(&self, event: ServerEvent) -> Option<usize> {
        let delivered = self.events_tx.send(event).ok();
        if let Some(receivers) = delivered {
            crate::infrastructure::metrics::record_broadcast(receivers);
        }
        delivered
    }

    /// Register a new session and get its event receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events_tx.subscribe()
    }

    /// Number of currently registered sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.events_tx.receiver_count()
    }
}

/// Shared broadcast hub reference.
pub type SharedBroadcastHub = Arc<BroadcastHub>;

// =============================================================================
// Tests
// =============================================================================
