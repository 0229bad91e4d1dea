//! Polygon.io market data provider implementation.
//!
//! Endpoints used:
//! - `/v2/aggs/ticker/{symbol}/prev` for the latest quote (previous session bar)
//! - `/v2/aggs/ticker/{symbol}/range/{multiplier}/{timespan}/{from}/{to}` for bars
//!
//! Polygon free tier is limited to 5 API calls per minute.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::errors::MarketDataError;
use crate::models::{
    change_percent, normalize_series, DataKind, HistoricalPoint, Interval, Quote,
};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

pub const BASE_URL: &str = "https://api.polygon.io";
pub const MIN_INTERVAL: Duration = Duration::from_secs(12);
const PROVIDER_ID: &str = "POLYGON";

/// Calendar days requested for intraday bars.
const INTRADAY_LOOKBACK_DAYS: i64 = 5;
/// Calendar days requested for daily bars.
const DAILY_LOOKBACK_DAYS: i64 = 180;

// ============================================================================
// API Response Structures
// ============================================================================

/// Aggregates response shared by /prev and /range.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggsResponse {
    status: Option<String>,
    #[serde(default)]
    results_count: Option<u64>,
    #[serde(default)]
    results: Vec<AggBar>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AggBar {
    /// Open
    o: f64,
    /// High
    h: f64,
    /// Low
    l: f64,
    /// Close
    c: f64,
    /// Volume (may be fractional for some tickers)
    #[serde(default)]
    v: f64,
    /// Bar start, epoch millis
    t: i64,
}

// ============================================================================
// PolygonProvider
// ============================================================================

/// Polygon.io market data provider.
pub struct PolygonProvider {
    client: Client,
    config: ProviderConfig,
}

impl PolygonProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apiKey", self.config.api_key.as_str()));

        let url = reqwest::Url::parse_with_params(
            &format!("{}{}", self.config.base_url, path),
            &all_params,
        )
        .map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to build URL: {}", e),
        })?;

        debug!(
            "Polygon request: {}",
            url.as_str().replace(&self.config.api_key, "***")
        );

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Request failed: {}", e),
                }
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: "Invalid or missing API key".to_string(),
            });
        }

        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })
    }

    /// Polygon's (multiplier, timespan) pair for an interval.
    fn range_params(interval: Interval) -> (u32, &'static str) {
        match interval {
            Interval::OneMinute => (1, "minute"),
            Interval::FiveMinutes => (5, "minute"),
            Interval::FifteenMinutes => (15, "minute"),
            Interval::ThirtyMinutes => (30, "minute"),
            Interval::Hourly => (1, "hour"),
            Interval::Daily => (1, "day"),
        }
    }

    /// `from`/`to` dates (YYYY-MM-DD) covering the lookback for an interval.
    fn date_range(interval: Interval, now: DateTime<Utc>) -> (String, String) {
        let days = if interval.is_intraday() {
            INTRADAY_LOOKBACK_DAYS
        } else {
            DAILY_LOOKBACK_DAYS
        };
        let from = now - ChronoDuration::days(days);
        (
            from.format("%Y-%m-%d").to_string(),
            now.format("%Y-%m-%d").to_string(),
        )
    }

    fn to_decimal(value: f64) -> Option<Decimal> {
        Decimal::try_from(value).ok()
    }

    fn parse_aggs(text: &str, symbol: &str) -> Result<Vec<AggBar>, MarketDataError> {
        let response: AggsResponse = serde_json::from_str(text)
            .map_err(|e| MarketDataError::parse(PROVIDER_ID, "aggregates", e))?;

        match response.status.as_deref() {
            Some("ERROR") | Some("NOT_AUTHORIZED") => {
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: response
                        .error
                        .or(response.message)
                        .unwrap_or_else(|| "Unknown error".to_string()),
                });
            }
            _ => {}
        }

        if response.results_count == Some(0) || response.results.is_empty() {
            return Err(MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        Ok(response.results)
    }

    /// Map a /prev body to a Quote. Change is measured against the session open.
    fn parse_prev_quote(text: &str, symbol: &str) -> Result<Quote, MarketDataError> {
        let bars = Self::parse_aggs(text, symbol)?;
        let bar = bars.last().ok_or_else(|| MarketDataError::NoData {
            provider: PROVIDER_ID.to_string(),
            symbol: symbol.to_string(),
        })?;

        let invalid = |field: &str, value: f64| MarketDataError::ValidationFailed {
            message: format!("Invalid {} from Polygon: {}", field, value),
        };

        let price = Self::to_decimal(bar.c).ok_or_else(|| invalid("close", bar.c))?;
        let open = Self::to_decimal(bar.o).ok_or_else(|| invalid("open", bar.o))?;
        let change = price - open;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent: change_percent(change, open),
            volume: Some(bar.v.max(0.0).round() as u64),
            high: Self::to_decimal(bar.h).unwrap_or(price),
            low: Self::to_decimal(bar.l).unwrap_or(price),
            open,
            previous_close: open,
            timestamp: Utc
                .timestamp_millis_opt(bar.t)
                .single()
                .unwrap_or_else(Utc::now),
            source: PROVIDER_ID.to_string(),
        })
    }

    /// Map a /range body to an ascending series.
    fn parse_range(text: &str, symbol: &str) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let bars = Self::parse_aggs(text, symbol)?;

        let points: Vec<HistoricalPoint> = bars
            .iter()
            .filter_map(|bar| {
                Some(HistoricalPoint {
                    timestamp: Utc.timestamp_millis_opt(bar.t).single()?,
                    open: Self::to_decimal(bar.o)?,
                    high: Self::to_decimal(bar.h)?,
                    low: Self::to_decimal(bar.l)?,
                    close: Self::to_decimal(bar.c)?,
                    volume: bar.v.max(0.0).round() as u64,
                })
            })
            .collect();

        if points.is_empty() {
            return Err(MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            });
        }

        Ok(normalize_series(points))
    }

    fn missing_credentials() -> MarketDataError {
        MarketDataError::MissingCredentials {
            provider: PROVIDER_ID.to_string(),
        }
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for PolygonProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        3
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            data_kinds: &[DataKind::Quote, DataKind::Historical],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            min_interval: self.config.min_interval,
        }
    }

    fn has_credentials(&self) -> bool {
        self.config.has_credentials()
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        if !self.has_credentials() {
            return Err(Self::missing_credentials());
        }

        debug!("Fetching previous session bar for {} from Polygon", symbol);
        let path = format!("/v2/aggs/ticker/{}/prev", symbol);
        let text = self.fetch(&path, &[("adjusted", "true")]).await?;
        Self::parse_prev_quote(&text, symbol)
    }

    async fn get_historical(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        if !self.has_credentials() {
            return Err(Self::missing_credentials());
        }

        let (multiplier, timespan) = Self::range_params(interval);
        let (from, to) = Self::date_range(interval, Utc::now());
        let path = format!(
            "/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            symbol, multiplier, timespan, from, to
        );

        let params = [("adjusted", "true"), ("sort", "asc"), ("limit", "5000")];
        let text = self.fetch(&path, &params).await?;
        let points = Self::parse_range(&text, symbol)?;

        debug!(
            "Polygon: fetched {} {} bars for {}",
            points.len(),
            interval,
            symbol
        );

        Ok(points)
    }
}
