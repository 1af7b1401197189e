//! WebSocket Session Server
//!
//! The `/ws` endpoint: one task per connected session, bridging the
//! shared broadcast hub and the client socket.
//!
//! # Session lifecycle
//!
//! On upgrade the session subscribes to the hub, sends the `connected`
//! acknowledgment, and, when a ticker is running with a known last
//! price, immediately sends a snapshot `price_update` so late joiners
//! are not left blank until the next tick. The session then pumps hub
//! events to the socket and parses inbound command frames until either
//! side closes. A send failure only ends this session; delivery to the
//! other sessions is unaffected.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::services::PollingScheduler;
use crate::domain::announcement::announcement_text;
use crate::domain::ticker::TickerStore;
use crate::infrastructure::broadcast::{ClientCommand, ServerEvent, SharedBroadcastHub};
use crate::infrastructure::metrics;

/// Shared state for the WebSocket endpoint.
#[derive(Clone)]
pub struct WsState {
    /// The polling scheduler commands are forwarded to.
    pub scheduler: Arc<PollingScheduler>,
    /// The shared ticker store, read for late-join snapshots.
    pub store: Arc<TickerStore>,
    /// The event fan-out hub.
    pub hub: SharedBroadcastHub,
    /// Interval applied when a start command omits one.
    pub default_interval_seconds: u64,
}

/// Build the `/ws` router.
pub fn router(state: WsState) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(state)
}

async fn ws_upgrade(State(state): State<WsState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, state))
}

async fn run_session(socket: WebSocket, state: WsState) {
    let session_id = Uuid::new_v4();
    metrics::session_connected();
    tracing::info!(%session_id, "session connected");

    pump_session(socket, &state, session_id).await;

    metrics::session_disconnected();
    tracing::info!(%session_id, "session disconnected");
}

async fn pump_session(socket: WebSocket, state: &WsState, session_id: Uuid) {
    let mut events = state.hub.subscribe();
    let (mut sink, mut stream) = socket.split();

    if send_event(&mut sink, &ServerEvent::connected()).await.is_err() {
        return;
    }

    if let Some(update) = snapshot_update(&state.store) {
        if send_event(&mut sink, &update).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if send_event(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(%session_id, skipped, "session lagged behind event stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_frame(state, session_id, text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                // Binary/ping/pong frames carry no commands
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::debug!(%session_id, %error, "session socket error");
                    break;
                }
            },
        }
    }
}

/// Parse and dispatch one inbound text frame.
fn handle_frame(state: &WsState, session_id: Uuid, text: &str) {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(ClientCommand::StartAnnouncements {
            symbol,
            interval_seconds,
        }) => {
            let interval = interval_seconds.unwrap_or(state.default_interval_seconds);
            if let Err(error) = state.scheduler.start(&symbol, interval) {
                tracing::debug!(%session_id, %error, "start command rejected");
                state.hub.publish(ServerEvent::error(error.to_string()));
            }
        }
        Ok(ClientCommand::StopAnnouncements) => {
            // Stopping an already stopped ticker is a quiet no-op
            state.scheduler.stop();
        }
        Err(error) => {
            tracing::debug!(%session_id, %error, "unparseable client frame");
            state
                .hub
                .publish(ServerEvent::error("unrecognized command"));
        }
    }
}

/// Snapshot of the running ticker as a `price_update`, if one exists.
fn snapshot_update(store: &TickerStore) -> Option<ServerEvent> {
    let snapshot = store.snapshot();
    if !snapshot.running {
        return None;
    }
    let symbol = snapshot.symbol?;
    let price = snapshot.last_price?;
    let at = snapshot.last_updated?;
    let announcement = announcement_text(&symbol, price);
    Some(ServerEvent::price_update(&symbol, price, announcement, at))
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(axum::Error::new)?;
    sink.send(Message::Text(json.into())).await
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn no_snapshot_when_stopped() {
        let store = TickerStore::with_defaults();
        assert_eq!(snapshot_update(&store), None);

        let started = store.start("AAPL", 5).unwrap();
        store.record_observation(started.generation, Decimal::ONE_HUNDRED, Utc::now());
        store.stop();
        assert_eq!(snapshot_update(&store), None);
    }

    #[test]
    fn no_snapshot_before_first_observation() {
        let store = TickerStore::with_defaults();
        store.start("AAPL", 5).unwrap();
        assert_eq!(snapshot_update(&store), None);
    }

    #[test]
    fn snapshot_carries_the_last_observation() {
        let store = TickerStore::with_defaults();
        let started = store.start("AAPL", 5).unwrap();
        let at = Utc::now();
        store.record_observation(started.generation, Decimal::new(18932, 2), at);

        match snapshot_update(&store) {
            Some(ServerEvent::PriceUpdate {
                symbol,
                price,
                announcement,
                timestamp,
            }) => {
                assert_eq!(symbol, "AAPL");
                assert!((price - 189.32).abs() < f64::EPSILON);
                assert_eq!(announcement, "AAPL is at 189.32 dollars");
                assert_eq!(timestamp, at.timestamp());
            }
            other => panic!("expected snapshot price update, got {other:?}"),
        }
    }
}
