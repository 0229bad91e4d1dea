//! Market data provider trait definitions.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{HistoricalPoint, IndicatorKind, IndicatorPoint, Interval, Quote};

use super::capabilities::{ProviderCapabilities, RateLimit};

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source. The
/// registry uses the provider's capabilities and priority to decide when to
/// call it, and paces calls according to its rate limit.
///
/// Adapters turn every failure (transport, HTTP status, vendor error body,
/// parse error, placeholder credentials) into a [`MarketDataError`]; the
/// registry treats all of them as "no data" and moves on.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider, e.g. "ALPHA_VANTAGE".
    ///
    /// Also used as the `source` tag on records the provider returns.
    fn id(&self) -> &'static str;

    /// Provider priority for ordering. Lower values = higher priority.
    fn priority(&self) -> u8 {
        10
    }

    /// Data kinds this provider serves.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Pacing applied by the registry before every call.
    fn rate_limit(&self) -> RateLimit;

    /// Whether a real API key is configured.
    fn has_credentials(&self) -> bool {
        true
    }

    /// Fetch the latest quote for a symbol.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch a historical series, sorted ascending by timestamp.
    async fn get_historical(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let _ = (symbol, interval);
        Err(MarketDataError::NotSupported {
            operation: "historical".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Fetch a technical indicator series.
    ///
    /// Ordering is normalized by the caller, so adapters may return points in
    /// vendor order.
    async fn get_indicator(
        &self,
        symbol: &str,
        kind: IndicatorKind,
    ) -> Result<Vec<IndicatorPoint>, MarketDataError> {
        let _ = (symbol, kind);
        Err(MarketDataError::NotSupported {
            operation: "indicator".to_string(),
            provider: self.id().to_string(),
        })
    }
}
