//! Announcement Formatting
//!
//! Pure formatting of a price observation into the human-readable
//! sentence used for both display and client-side speech playback.

use rust_decimal::Decimal;

use super::ticker::Symbol;

/// Format a price observation as an announcement sentence.
///
/// The caller guarantees a valid symbol and a price already rounded to
/// cents; there are no failure modes here.
#[must_use]
pub fn announcement_text(symbol: &Symbol, price: Decimal) -> String {
    format!("{symbol} is at {price} dollars")
}
