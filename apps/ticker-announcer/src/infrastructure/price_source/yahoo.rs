//! Yahoo Finance chart-API adapter.
//!
//! Fetches the latest price from the public chart endpoint. The regular
//! market price is preferred; when the market is closed and the field is
//! absent, the previous close is used as a fallback. Prices are rounded
//! to cents before they enter the domain.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::ports::{PriceSource, PriceSourceError};
use crate::domain::ticker::Symbol;
use crate::infrastructure::config::QuoteApiSettings;

/// Production quote endpoint.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Price source backed by the Yahoo Finance chart API.
#[derive(Debug)]
pub struct YahooPriceSource {
    http: reqwest::Client,
    base_url: String,
}

impl YahooPriceSource {
    /// Build an adapter from quote-API settings.
    ///
    /// # Errors
    ///
    /// Returns the underlying error when the HTTP client cannot be
    /// constructed.
    pub fn new(settings: &QuoteApiSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("ticker-announcer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
        })
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    async fn latest_price(&self, symbol: &Symbol) -> Result<Decimal, PriceSourceError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol.as_str());
        let response = self
            .http
            .get(&url)
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| PriceSourceError::Unreachable {
                message: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PriceSourceError::UnknownSymbol {
                symbol: symbol.as_str().to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(PriceSourceError::Unreachable {
                message: format!("quote API returned {}", response.status()),
            });
        }

        let body: ChartResponse =
            response
                .json()
                .await
                .map_err(|e| PriceSourceError::Unreachable {
                    message: e.to_string(),
                })?;

        extract_price(&body).ok_or(PriceSourceError::DataUnavailable)
    }
}

// =============================================================================
// Response Parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
}

/// Pull the best available price out of a chart response, in cents.
fn extract_price(body: &ChartResponse) -> Option<Decimal> {
    let meta = &body.chart.result.as_ref()?.first()?.meta;
    let raw = meta.regular_market_price.or(meta.chart_previous_close)?;
    Decimal::try_from(raw).ok().map(|d| d.round_dp(2))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn prefers_regular_market_price() {
        let body = parse(
            r#"{"chart": {"result": [{"meta": {
                "regularMarketPrice": 189.317,
                "chartPreviousClose": 185.0
            }}]}}"#,
        );
        assert_eq!(extract_price(&body), Some(Decimal::new(18932, 2)));
    }

    #[test]
    fn falls_back_to_previous_close() {
        let body = parse(
            r#"{"chart": {"result": [{"meta": {
                "chartPreviousClose": 250.5
            }}]}}"#,
        );
        assert_eq!(extract_price(&body), Some(Decimal::new(25050, 2)));
    }

    #[test]
    fn no_price_fields_yields_none() {
        let body = parse(r#"{"chart": {"result": [{"meta": {}}]}}"#);
        assert_eq!(extract_price(&body), None);
    }

    #[test]
    fn empty_result_yields_none() {
        assert_eq!(
            extract_price(&parse(r#"{"chart": {"result": []}}"#)),
            None
        );
        assert_eq!(extract_price(&parse(r#"{"chart": {}}"#)), None);
    }

    #[test]
    fn prices_are_rounded_to_cents() {
        let body = parse(
            r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 100.017}}]}}"#,
        );
        assert_eq!(extract_price(&body), Some(Decimal::new(10002, 2)));
    }
}
