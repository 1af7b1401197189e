//! Polling Scheduler
//!
//! Drives the periodic fetch/announce cycle for exactly one active
//! ticker generation at a time.
//!
//! # Design
//!
//! Every `start` issues a fresh generation from the [`TickerStore`] and
//! spawns one tick loop tagged with it. Replacement cancels the previous
//! loop's token, but cancellation is cooperative: a fetch already in
//! flight is not interrupted, its result simply fails the generation
//! check in `record_observation` and is dropped without a broadcast.
//!
//! The first tick fires immediately on start, then every interval
//! thereafter, so clients are not kept waiting a full interval for the
//! first announcement.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::PriceSource;
use crate::domain::announcement::announcement_text;
use crate::domain::ticker::{StartedTicker, Symbol, TickerError, TickerStore};
use crate::infrastructure::broadcast::{ServerEvent, SharedBroadcastHub};
use crate::infrastructure::metrics;

/// Handle to the schedule of one generation.
#[derive(Debug)]
struct ScheduleHandle {
    generation: u64,
    cancel: CancellationToken,
}

/// Schedules price polling for the shared ticker.
///
/// All start/stop transitions are serialized under one mutex so that
/// concurrent client commands cannot interleave: the later start fully
/// wins, and at most one generation's ticks ever produce visible
/// broadcasts.
pub struct PollingScheduler {
    store: Arc<TickerStore>,
    source: Arc<dyn PriceSource>,
    hub: SharedBroadcastHub,
    active: Mutex<Option<ScheduleHandle>>,
}

impl PollingScheduler {
    /// Create a scheduler over the given store, price source, and hub.
    #[must_use]
    pub fn new(
        store: Arc<TickerStore>,
        source: Arc<dyn PriceSource>,
        hub: SharedBroadcastHub,
    ) -> Self {
        Self {
            store,
            source,
            hub,
            active: Mutex::new(None),
        }
    }

    /// Start (or replace) the shared ticker schedule.
    ///
    /// Publishes `started` to all sessions before the new tick loop is
    /// spawned, so `started` always precedes the first price of its
    /// generation.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError`] on validation failure; no state changes
    /// and nothing is broadcast.
    pub fn start(
        &self,
        symbol: &str,
        interval_seconds: u64,
    ) -> Result<StartedTicker, TickerError> {
        let mut active = self.active.lock();
        let started = self.store.start(symbol, interval_seconds)?;

        let cancel = CancellationToken::new();
        if let Some(previous) = active.replace(ScheduleHandle {
            generation: started.generation,
            cancel: cancel.clone(),
        }) {
            previous.cancel.cancel();
            tracing::debug!(
                superseded = previous.generation,
                generation = started.generation,
                "previous schedule cancelled"
            );
        }

        self.hub.publish(ServerEvent::started(
            &started.symbol,
            started.interval_seconds,
        ));
        self.spawn_tick_loop(started.clone(), cancel);

        tracing::info!(
            symbol = %started.symbol,
            interval_seconds,
            generation = started.generation,
            "ticker started"
        );
        Ok(started)
    }

    /// Stop the shared ticker schedule.
    ///
    /// Returns the stopped generation, or `None` when nothing was
    /// running. The no-op case does not re-broadcast `stopped`.
    pub fn stop(&self) -> Option<u64> {
        let mut active = self.active.lock();
        let stopped = self.store.stop()?;
        if let Some(handle) = active.take() {
            handle.cancel.cancel();
        }
        self.hub.publish(ServerEvent::stopped());
        tracing::info!(generation = stopped, "ticker stopped");
        Some(stopped)
    }

    /// Cancel any active schedule without broadcasting.
    ///
    /// Used on process shutdown, when sessions are going away anyway.
    pub fn shutdown(&self) {
        let mut active = self.active.lock();
        self.store.stop();
        if let Some(handle) = active.take() {
            handle.cancel.cancel();
        }
    }

    fn spawn_tick_loop(&self, started: StartedTicker, cancel: CancellationToken) {
        let store = Arc::clone(&self.store);
        let source = Arc::clone(&self.source);
        let hub = Arc::clone(&self.hub);

        tokio::spawn(async move {
            let StartedTicker {
                symbol,
                interval_seconds,
                generation,
            } = started;

            let mut timer = tokio::time::interval(Duration::from_secs(interval_seconds));
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = timer.tick() => {}
                }

                let outcome = run_tick(&store, source.as_ref(), &hub, &symbol, generation).await;
                if outcome == TickOutcome::Superseded {
                    break;
                }
            }

            tracing::debug!(%symbol, generation, "tick loop exited");
        });
    }
}

/// Result of one fetch/announce cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    /// Observation accepted and broadcast.
    Published,
    /// Fetch failed; reported, schedule continues.
    Failed,
    /// Generation no longer live; loop must exit.
    Superseded,
}

async fn run_tick(
    store: &TickerStore,
    source: &dyn PriceSource,
    hub: &SharedBroadcastHub,
    symbol: &Symbol,
    generation: u64,
) -> TickOutcome {
    metrics::record_tick();

    // The fetch is the only await point and runs without the store lock,
    // so client start/stop commands are never blocked on the network.
    match source.latest_price(symbol).await {
        Ok(price) => {
            let now = Utc::now();
            if store.record_observation(generation, price, now) {
                let announcement = announcement_text(symbol, price);
                hub.publish(ServerEvent::price_update(symbol, price, announcement, now));
                TickOutcome::Published
            } else {
                // Superseded or stopped between fetch start and completion;
                // an expected race outcome, dropped without a broadcast.
                metrics::record_stale_observation();
                tracing::debug!(%symbol, generation, "stale observation discarded");
                TickOutcome::Superseded
            }
        }
        Err(error) => {
            metrics::record_fetch_failure();
            if store.is_current(generation) {
                tracing::warn!(%symbol, generation, %error, "price fetch failed");
                hub.publish(ServerEvent::error(format!(
                    "Could not fetch price for {symbol}: {error}"
                )));
                TickOutcome::Failed
            } else {
                TickOutcome::Superseded
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::infrastructure::broadcast::BroadcastHub;
    use crate::infrastructure::price_source::MockPriceSource;

    fn setup(
        min_interval: u64,
    ) -> (
        Arc<TickerStore>,
        Arc<MockPriceSource>,
        SharedBroadcastHub,
        PollingScheduler,
    ) {
        let store = Arc::new(TickerStore::new(min_interval));
        let source = Arc::new(MockPriceSource::new());
        let hub = Arc::new(BroadcastHub::with_defaults());
        let scheduler = PollingScheduler::new(
            Arc::clone(&store),
            Arc::clone(&source) as Arc<dyn PriceSource>,
            Arc::clone(&hub),
        );
        (store, source, hub, scheduler)
    }

    #[tokio::test(start_paused = true)]
    async fn started_precedes_first_price_update() {
        let (_store, source, hub, scheduler) = setup(1);
        source.set_price("AAPL", Decimal::new(18932, 2));

        let mut rx = hub.subscribe();
        scheduler.start("AAPL", 1).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first,
            ServerEvent::Started {
                symbol: "AAPL".to_string(),
                interval_seconds: 1
            }
        );

        let second = rx.recv().await.unwrap();
        match second {
            ServerEvent::PriceUpdate {
                symbol,
                price,
                announcement,
                ..
            } => {
                assert_eq!(symbol, "AAPL");
                assert!((price - 189.32).abs() < f64::EPSILON);
                assert_eq!(announcement, "AAPL is at 189.32 dollars");
            }
            other => panic!("expected price update, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_start_broadcasts_nothing() {
        let (store, _source, hub, scheduler) = setup(5);

        let mut rx = hub.subscribe();
        assert!(scheduler.start("AAPL", 1).is_err());
        assert!(scheduler.start("", 5).is_err());

        assert!(!store.snapshot().running);
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_broadcasts_once_then_noop() {
        let (_store, source, hub, scheduler) = setup(1);
        source.set_price("AAPL", Decimal::ONE_HUNDRED);

        scheduler.start("AAPL", 1).unwrap();
        let mut rx = hub.subscribe();

        assert!(scheduler.stop().is_some());
        assert_eq!(rx.recv().await.unwrap(), ServerEvent::Stopped {});

        // Already stopped: no second broadcast
        assert!(scheduler.stop().is_none());
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }
}
