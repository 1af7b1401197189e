//! Price Source Adapters
//!
//! Implementations of the `PriceSource` port.

pub mod mock;
pub mod yahoo;

pub use mock::MockPriceSource;
pub use yahoo::YahooPriceSource;
