//! Shared Ticker State
//!
//! Domain types for the single process-wide ticker subscription.
//!
//! # Design
//!
//! The process owns exactly one `TickerStore`. All mutation funnels
//! through `start`, `stop`, and `record_observation`, serialized under
//! one mutex. Every `start` bumps a monotonic generation counter; any
//! observation tagged with a superseded generation is rejected, which is
//! how in-flight fetches from a replaced schedule are prevented from
//! overwriting newer state.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default floor for the polling interval, in seconds.
///
/// The UI offers minute granularity; values are converted to seconds
/// before they reach the store, and anything below this floor is
/// rejected rather than clamped.
pub const DEFAULT_MIN_INTERVAL_SECONDS: u64 = 5;

// =============================================================================
// Symbol
// =============================================================================

/// A ticker symbol (stock, ETF, or index).
///
/// Normalized to uppercase with surrounding whitespace removed. Index
/// symbols carry a leading `^` marker (e.g. `^GSPC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::EmptySymbol`] when the input is empty or
    /// whitespace-only.
    pub fn parse(value: &str) -> Result<Self, TickerError> {
        let normalized = value.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(TickerError::EmptySymbol);
        }
        Ok(Self(normalized))
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Check if this symbol names an index (leading `^` marker).
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.0.starts_with('^')
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Validation error for ticker start requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerError {
    /// The symbol was empty after normalization.
    #[error("please provide a ticker symbol")]
    EmptySymbol,
    /// The requested interval is below the configured floor.
    #[error("interval must be at least {min} seconds, got {got}")]
    IntervalTooShort {
        /// Configured minimum interval in seconds.
        min: u64,
        /// The rejected value.
        got: u64,
    },
}

// =============================================================================
// Ticker State
// =============================================================================

/// The single shared ticker record.
#[derive(Debug, Clone, Default)]
pub struct TickerState {
    /// Currently selected symbol, if any ticker was ever started.
    pub symbol: Option<Symbol>,
    /// Polling cadence of the current generation, in seconds.
    pub interval_seconds: u64,
    /// Whether a polling schedule is active for this state.
    pub running: bool,
    /// Last accepted price observation.
    pub last_price: Option<Decimal>,
    /// Time of the last accepted observation.
    pub last_updated: Option<DateTime<Utc>>,
    /// Monotonic counter identifying one start-to-stop lifetime.
    pub generation: u64,
}

/// Outcome of a successful `start`, used to tag the new schedule.
#[derive(Debug, Clone)]
pub struct StartedTicker {
    /// The normalized symbol.
    pub symbol: Symbol,
    /// Cadence in seconds.
    pub interval_seconds: u64,
    /// The freshly issued generation.
    pub generation: u64,
}

// =============================================================================
// Ticker Store
// =============================================================================

/// Single source of truth for the active ticker.
///
/// Exactly one instance exists per process. Mutations are serialized;
/// `snapshot` takes the same lock briefly so readers never observe a
/// torn state.
///
/// # Example
///
/// ```rust
/// use ticker_announcer::domain::ticker::TickerStore;
///
/// let store = TickerStore::with_defaults();
/// let started = store.start("aapl", 5).unwrap();
/// assert_eq!(started.symbol.as_str(), "AAPL");
/// assert!(store.snapshot().running);
///
/// assert_eq!(store.stop(), Some(started.generation));
/// assert_eq!(store.stop(), None);
/// ```
#[derive(Debug)]
pub struct TickerStore {
    state: Mutex<TickerState>,
    min_interval_seconds: u64,
}

impl Default for TickerStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TickerStore {
    /// Create a store with a custom interval floor.
    #[must_use]
    pub fn new(min_interval_seconds: u64) -> Self {
        Self {
            state: Mutex::new(TickerState::default()),
            min_interval_seconds,
        }
    }

    /// Create a store with the default 5 second interval floor.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL_SECONDS)
    }

    /// The configured interval floor in seconds.
    #[must_use]
    pub const fn min_interval_seconds(&self) -> u64 {
        self.min_interval_seconds
    }

    /// Start (or replace) the shared ticker.
    ///
    /// Atomically bumps the generation, stores the symbol and interval,
    /// marks the state running, and clears the last observation. Any
    /// previous generation is implicitly superseded: its in-flight
    /// results will fail the `record_observation` generation check.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError`] when the symbol is empty or the interval
    /// is below the floor. Validation failures leave the state and
    /// generation untouched.
    pub fn start(
        &self,
        symbol: &str,
        interval_seconds: u64,
    ) -> Result<StartedTicker, TickerError> {
        let symbol = Symbol::parse(symbol)?;
        if interval_seconds < self.min_interval_seconds {
            return Err(TickerError::IntervalTooShort {
                min: self.min_interval_seconds,
                got: interval_seconds,
            });
        }

        let mut state = self.state.lock();
        state.generation += 1;
        state.symbol = Some(symbol.clone());
        state.interval_seconds = interval_seconds;
        state.running = true;
        state.last_price = None;
        state.last_updated = None;

        Ok(StartedTicker {
            symbol,
            interval_seconds,
            generation: state.generation,
        })
    }

    /// Stop the shared ticker.
    ///
    /// Returns the generation being stopped, or `None` when nothing was
    /// running (a no-op: state and generation unchanged).
    pub fn stop(&self) -> Option<u64> {
        let mut state = self.state.lock();
        if !state.running {
            return None;
        }
        state.running = false;
        Some(state.generation)
    }

    /// Record a price observation for the given generation.
    ///
    /// Accepted only while that generation is current and running. A
    /// `false` return is the expected outcome of the stop/replace race,
    /// not an error; the caller must discard the result silently.
    pub fn record_observation(
        &self,
        generation: u64,
        price: Decimal,
        at: DateTime<Utc>,
    ) -> bool {
        let mut state = self.state.lock();
        if !state.running || state.generation != generation {
            return false;
        }
        state.last_price = Some(price);
        state.last_updated = Some(at);
        true
    }

    /// Check whether a generation is still the live one.
    #[must_use]
    pub fn is_current(&self, generation: u64) -> bool {
        let state = self.state.lock();
        state.running && state.generation == generation
    }

    /// Take a consistent copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> TickerState {
        self.state.lock().clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("aapl", "AAPL" ; "lowercase")]
    #[test_case("  spy ", "SPY" ; "surrounding whitespace")]
    #[test_case("^gspc", "^GSPC" ; "index marker")]
    #[test_case("BRK.B", "BRK.B" ; "share class suffix")]
    fn symbol_normalization(input: &str, expected: &str) {
        assert_eq!(Symbol::parse(input).unwrap().as_str(), expected);
    }

    #[test]
    fn symbol_rejects_empty_input() {
        assert_eq!(Symbol::parse(""), Err(TickerError::EmptySymbol));
        assert_eq!(Symbol::parse("   "), Err(TickerError::EmptySymbol));
    }

    #[test]
    fn symbol_index_marker() {
        assert!(Symbol::parse("^gspc").unwrap().is_index());
        assert!(!Symbol::parse("SPY").unwrap().is_index());
    }

    #[test]
    fn start_sets_running_and_bumps_generation() {
        let store = TickerStore::with_defaults();
        let before = store.snapshot().generation;

        let started = store.start("AAPL", 5).unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.running);
        assert_eq!(snapshot.symbol, Some(started.symbol));
        assert_eq!(snapshot.interval_seconds, 5);
        assert!(snapshot.generation > before);
    }

    #[test]
    fn start_clears_previous_observation() {
        let store = TickerStore::with_defaults();
        let started = store.start("AAPL", 5).unwrap();
        assert!(store.record_observation(
            started.generation,
            Decimal::new(18932, 2),
            Utc::now()
        ));

        store.start("TSLA", 10).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.last_price, None);
        assert_eq!(snapshot.last_updated, None);
    }

    #[test]
    fn start_rejects_interval_below_floor() {
        let store = TickerStore::with_defaults();
        let result = store.start("AAPL", 4);
        assert_eq!(
            result.unwrap_err(),
            TickerError::IntervalTooShort { min: 5, got: 4 }
        );
        // Rejected requests must not disturb the state
        assert_eq!(store.snapshot().generation, 0);
        assert!(!store.snapshot().running);
    }

    #[test]
    fn start_rejects_empty_symbol() {
        let store = TickerStore::with_defaults();
        assert_eq!(store.start("  ", 5).unwrap_err(), TickerError::EmptySymbol);
    }

    #[test]
    fn custom_interval_floor() {
        let store = TickerStore::new(60);
        assert!(store.start("AAPL", 59).is_err());
        assert!(store.start("AAPL", 60).is_ok());
    }

    #[test]
    fn stop_returns_generation_once() {
        let store = TickerStore::with_defaults();
        let started = store.start("AAPL", 5).unwrap();

        assert_eq!(store.stop(), Some(started.generation));
        // Second stop is a no-op: no generation change, nothing returned
        assert_eq!(store.stop(), None);
        assert_eq!(store.snapshot().generation, started.generation);
    }

    #[test]
    fn stop_when_never_started_is_noop() {
        let store = TickerStore::with_defaults();
        assert_eq!(store.stop(), None);
        assert_eq!(store.snapshot().generation, 0);
    }

    #[test]
    fn record_observation_accepts_current_generation() {
        let store = TickerStore::with_defaults();
        let started = store.start("AAPL", 5).unwrap();
        let at = Utc::now();

        assert!(store.record_observation(started.generation, Decimal::new(18932, 2), at));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.last_price, Some(Decimal::new(18932, 2)));
        assert_eq!(snapshot.last_updated, Some(at));
    }

    #[test]
    fn record_observation_rejects_superseded_generation() {
        let store = TickerStore::with_defaults();
        let old = store.start("AAPL", 5).unwrap();
        store.start("TSLA", 10).unwrap();

        assert!(!store.record_observation(old.generation, Decimal::ONE, Utc::now()));
        assert_eq!(store.snapshot().last_price, None);
    }

    #[test]
    fn record_observation_rejects_when_stopped() {
        let store = TickerStore::with_defaults();
        let started = store.start("AAPL", 5).unwrap();
        store.stop();

        assert!(!store.record_observation(started.generation, Decimal::ONE, Utc::now()));
    }

    #[test]
    fn generation_strictly_increases_across_restarts() {
        let store = TickerStore::with_defaults();
        let first = store.start("AAPL", 5).unwrap().generation;
        store.stop();
        let second = store.start("AAPL", 5).unwrap().generation;
        let third = store.start("MSFT", 5).unwrap().generation;

        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn is_current_tracks_replacement_and_stop() {
        let store = TickerStore::with_defaults();
        let first = store.start("AAPL", 5).unwrap().generation;
        assert!(store.is_current(first));

        let second = store.start("TSLA", 5).unwrap().generation;
        assert!(!store.is_current(first));
        assert!(store.is_current(second));

        store.stop();
        assert!(!store.is_current(second));
    }

    #[test]
    fn concurrent_starts_last_writer_wins() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(TickerStore::with_defaults());
        let mut handles = vec![];

        for i in 0..10u64 {
            let s = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                s.start(&format!("SYM{i}"), 5).unwrap()
            }));
        }

        let mut generations: Vec<u64> = handles
            .into_iter()
            .map(|h| h.join().unwrap().generation)
            .collect();
        generations.sort_unstable();
        generations.dedup();

        // Every start got a distinct generation and the store settled on
        // the highest one
        assert_eq!(generations.len(), 10);
        let snapshot = store.snapshot();
        assert_eq!(Some(snapshot.generation), generations.last().copied());
        assert!(snapshot.running);
    }
}
