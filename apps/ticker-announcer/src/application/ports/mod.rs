//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems. The core treats
//! market data retrieval as a black box: given a symbol, return a price
//! or fail with an opaque reason.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::ticker::Symbol;

/// Price retrieval error.
///
/// The scheduler treats all variants the same way: report and keep
/// ticking. The distinction exists for logs and error messages.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PriceSourceError {
    /// The source could not be reached (network failure, rate limit).
    #[error("price source unreachable: {message}")]
    Unreachable {
        /// Error details.
        message: String,
    },

    /// The source does not know the symbol.
    #[error("unknown symbol: {symbol}")]
    UnknownSymbol {
        /// The rejected symbol.
        symbol: String,
    },

    /// The source responded but carried no usable price.
    #[error("price data unavailable")]
    DataUnavailable,
}

/// Port for fetching the latest price of a symbol.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the latest price, rounded to cents.
    async fn latest_price(&self, symbol: &Symbol) -> Result<Decimal, PriceSourceError>;
}
