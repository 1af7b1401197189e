//! Mock price source for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::application::ports::{PriceSource, PriceSourceError};
use crate::domain::ticker::Symbol;

/// Mock price source for testing.
///
/// Supports scripted prices, scripted failures, and an artificial fetch
/// delay for exercising the stop/replace race with an in-flight fetch.
#[derive(Debug, Default)]
pub struct MockPriceSource {
    prices: Mutex<HashMap<String, Decimal>>,
    failures_remaining: Mutex<u32>,
    fetch_delay: Mutex<Option<Duration>>,
    calls: AtomicU64,
}

impl MockPriceSource {
    /// Create a mock with no prices and no scripted behavior.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price returned for a symbol.
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        self.prices
            .lock()
            .insert(symbol.to_uppercase(), price);
    }

    /// Make the next `count` fetches fail with an unreachable error.
    pub fn fail_next_calls(&self, count: u32) {
        *self.failures_remaining.lock() = count;
    }

    /// Delay every fetch by the given duration.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    /// Number of fetches performed so far.
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn latest_price(&self, symbol: &Symbol) -> Result<Decimal, PriceSourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut failures = self.failures_remaining.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(PriceSourceError::Unreachable {
                    message: "scripted failure".to_string(),
                });
            }
        }

        self.prices
            .lock()
            .get(symbol.as_str())
            .copied()
            .ok_or_else(|| PriceSourceError::UnknownSymbol {
                symbol: symbol.as_str().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_scripted_price() {
        let source = MockPriceSource::new();
        source.set_price("aapl", Decimal::new(18932, 2));

        let price = source
            .latest_price(&Symbol::parse("AAPL").unwrap())
            .await
            .unwrap();
        assert_eq!(price, Decimal::new(18932, 2));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_symbol_errors() {
        let source = MockPriceSource::new();
        let result = source.latest_price(&Symbol::parse("NOPE").unwrap()).await;
        assert!(matches!(
            result,
            Err(PriceSourceError::UnknownSymbol { symbol }) if symbol == "NOPE"
        ));
    }

    #[tokio::test]
    async fn scripted_failures_then_recovery() {
        let source = MockPriceSource::new();
        source.set_price("AAPL", Decimal::ONE_HUNDRED);
        source.fail_next_calls(2);

        let symbol = Symbol::parse("AAPL").unwrap();
        assert!(source.latest_price(&symbol).await.is_err());
        assert!(source.latest_price(&symbol).await.is_err());
        assert!(source.latest_price(&symbol).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_delay_is_applied() {
        let source = MockPriceSource::new();
        source.set_price("AAPL", Decimal::ONE_HUNDRED);
        source.set_fetch_delay(Duration::from_millis(300));

        let start = tokio::time::Instant::now();
        source
            .latest_price(&Symbol::parse("AAPL").unwrap())
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
