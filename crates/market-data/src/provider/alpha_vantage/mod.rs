//! Alpha Vantage market data provider implementation.
//!
//! This module provides market data from the Alpha Vantage API:
//! - Real-time quotes via GLOBAL_QUOTE
//! - Intraday and daily bars via TIME_SERIES_INTRADAY / TIME_SERIES_DAILY
//! - Technical indicators via RSI, SMA, EMA and MACD
//!
//! Alpha Vantage is first in the quote fallback order and is the only provider
//! that substitutes demo data itself: without a real API key its quotes are
//! synthetic. Historical and indicator requests without a key report missing
//! credentials like every other provider.
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use log::{debug, info, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::errors::MarketDataError;
use crate::models::{
    change_percent, normalize_series, DataKind, HistoricalPoint, IndicatorKind, IndicatorPoint,
    IndicatorValue, Interval, Quote, MACD_PERIODS,
};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};
use crate::synthetic::SyntheticGenerator;

pub const BASE_URL: &str = "https://www.alphavantage.co/query";
pub const MIN_INTERVAL: Duration = Duration::from_secs(12);
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

/// Fields shared by every Alpha Vantage response that signal failure.
#[derive(Debug, Default, Deserialize)]
struct ApiStatus {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// GLOBAL_QUOTE response
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(flatten)]
    status: ApiStatus,
}

/// All values arrive as strings; an unknown symbol yields an empty object.
#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "02. open")]
    open: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

/// TIME_SERIES_* response. The series key depends on the interval
/// ("Time Series (5min)", "Time Series (Daily)"), so it is captured dynamically.
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(flatten)]
    status: ApiStatus,
    #[serde(flatten)]
    rest: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Bar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

/// Technical indicator response ("Technical Analysis: RSI" etc.).
#[derive(Debug, Deserialize)]
struct IndicatorResponse {
    #[serde(flatten)]
    status: ApiStatus,
    #[serde(flatten)]
    rest: HashMap<String, serde_json::Value>,
}

// ============================================================================
// AlphaVantageProvider
// ============================================================================

/// Alpha Vantage market data provider.
pub struct AlphaVantageProvider {
    client: Client,
    config: ProviderConfig,
    synthetic: Arc<SyntheticGenerator>,
}

impl AlphaVantageProvider {
    /// Create a provider. `synthetic` supplies demo quotes when the key is a
    /// placeholder.
    pub fn new(config: ProviderConfig, synthetic: Arc<SyntheticGenerator>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            config,
            synthetic,
        }
    }

    /// Make a request to the Alpha Vantage API.
    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", self.config.api_key.as_str()));

        let url = reqwest::Url::parse_with_params(&self.config.base_url, &all_params).map_err(
            |e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to build URL: {}", e),
            },
        )?;

        debug!(
            "Alpha Vantage request: {}",
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
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
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
                message: e.to_string(),
            })
    }

    /// Check for API-level errors in the response.
    fn check_api_error(status: &ApiStatus) -> Result<(), MarketDataError> {
        if let Some(ref msg) = status.error_message {
            if msg.contains("Invalid API call") || msg.contains("not found") {
                return Err(MarketDataError::SymbolNotFound(msg.clone()));
            }
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg.clone(),
            });
        }

        // "Note" and "Information" carry throttling notices on the free tier
        for msg in [&status.note, &status.information].into_iter().flatten() {
            if msg.contains("API call frequency")
                || msg.contains("rate limit")
                || msg.contains("requests per day")
            {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            warn!("Alpha Vantage notice: {}", msg);
        }

        Ok(())
    }

    fn parse_decimal(s: &str) -> Option<Decimal> {
        Decimal::from_str(s.trim()).ok()
    }

    /// Parse a "1.2345%" style percent string.
    fn parse_percent(s: &str) -> Option<Decimal> {
        Self::parse_decimal(s.trim().trim_end_matches('%'))
    }

    /// Parse a date (YYYY-MM-DD) to midnight UTC.
    fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
        NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|dt| Utc.from_local_datetime(&dt).single())
    }

    /// Parse a series key: intraday keys are US/Eastern wall-clock times,
    /// daily keys are plain dates.
    fn parse_series_timestamp(key: &str) -> Option<DateTime<Utc>> {
        let key = key.trim();
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(key, format) {
                return New_York
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc));
            }
        }
        Self::parse_date(key)
    }

    fn function_for(interval: Interval) -> &'static str {
        if interval.is_intraday() {
            "TIME_SERIES_INTRADAY"
        } else {
            "TIME_SERIES_DAILY"
        }
    }

    /// Map a GLOBAL_QUOTE body to a Quote.
    fn parse_global_quote(text: &str, symbol: &str) -> Result<Quote, MarketDataError> {
        let response: GlobalQuoteResponse = serde_json::from_str(text)
            .map_err(|e| MarketDataError::parse(PROVIDER_ID, "quote", e))?;

        Self::check_api_error(&response.status)?;

        let quote = response.global_quote.unwrap_or_default();
        let price = quote
            .price
            .as_deref()
            .and_then(Self::parse_decimal)
            .ok_or_else(|| MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            })?;

        let previous_close = quote
            .previous_close
            .as_deref()
            .and_then(Self::parse_decimal)
            .unwrap_or(price);
        let change = quote
            .change
            .as_deref()
            .and_then(Self::parse_decimal)
            .unwrap_or(price - previous_close);
        let percent = quote
            .change_percent
            .as_deref()
            .and_then(Self::parse_percent)
            .unwrap_or_else(|| change_percent(change, previous_close));

        let timestamp = quote
            .latest_trading_day
            .as_deref()
            .and_then(Self::parse_date)
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: quote.symbol.unwrap_or_else(|| symbol.to_string()),
            price,
            change,
            change_percent: percent,
            volume: quote.volume.as_deref().and_then(|v| v.trim().parse().ok()),
            high: quote.high.as_deref().and_then(Self::parse_decimal).unwrap_or(price),
            low: quote.low.as_deref().and_then(Self::parse_decimal).unwrap_or(price),
            open: quote.open.as_deref().and_then(Self::parse_decimal).unwrap_or(price),
            previous_close,
            timestamp,
            source: PROVIDER_ID.to_string(),
        })
    }

    /// Map a TIME_SERIES_* body to an ascending series.
    fn parse_time_series(text: &str, symbol: &str) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let response: TimeSeriesResponse = serde_json::from_str(text)
            .map_err(|e| MarketDataError::parse(PROVIDER_ID, "time series", e))?;

        Self::check_api_error(&response.status)?;

        let series = response
            .rest
            .into_iter()
            .find(|(key, _)| key.starts_with("Time Series"))
            .map(|(_, value)| value)
            .ok_or_else(|| MarketDataError::NoData {
                provider: PROVIDER_ID.to_string(),
                symbol: symbol.to_string(),
            })?;

        let bars: HashMap<String, Bar> = serde_json::from_value(series)
            .map_err(|e| MarketDataError::parse(PROVIDER_ID, "time series", e))?;

        let points: Vec<HistoricalPoint> = bars
            .into_iter()
            .filter_map(|(key, bar)| {
                Some(HistoricalPoint {
                    timestamp: Self::parse_series_timestamp(&key)?,
                    open: Self::parse_decimal(&bar.open)?,
                    high: Self::parse_decimal(&bar.high)?,
                    low: Self::parse_decimal(&bar.low)?,
                    close: Self::parse_decimal(&bar.close)?,
                    volume: bar.volume.trim().parse().ok()?,
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

    /// Map a technical indicator body to points (vendor order).
    fn parse_indicator(
        text: &str,
        symbol: &str,
        kind: IndicatorKind,
    ) -> Result<Vec<IndicatorPoint>, MarketDataError> {
        let response: IndicatorResponse = serde_json::from_str(text)
            .map_err(|e| MarketDataError::parse(PROVIDER_ID, "indicator", e))?;

        Self::check_api_error(&response.status)?;

        let section = format!("Technical Analysis: {}", kind.function());
        let no_data = || MarketDataError::NoData {
            provider: PROVIDER_ID.to_string(),
            symbol: symbol.to_string(),
        };

        let values = response
            .rest
            .into_iter()
            .find(|(key, _)| *key == section)
            .map(|(_, value)| value)
            .ok_or_else(no_data)?;

        let rows: HashMap<String, HashMap<String, String>> = serde_json::from_value(values)
            .map_err(|e| MarketDataError::parse(PROVIDER_ID, "indicator", e))?;

        let field = |row: &HashMap<String, String>, name: &str| {
            row.get(name).and_then(|v| Self::parse_decimal(v))
        };

        let points: Vec<IndicatorPoint> = rows
            .into_iter()
            .filter_map(|(key, row)| {
                let timestamp = Self::parse_series_timestamp(&key)?;
                let value = match kind {
                    IndicatorKind::Macd => IndicatorValue::Macd {
                        macd: field(&row, "MACD")?,
                        signal: field(&row, "MACD_Signal")?,
                        histogram: field(&row, "MACD_Hist")?,
                    },
                    _ => IndicatorValue::Single {
                        value: field(&row, kind.function())?,
                    },
                };
                Some(IndicatorPoint { timestamp, value })
            })
            .collect();

        if points.is_empty() {
            return Err(no_data());
        }

        Ok(points)
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
impl MarketDataProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // First choice for every data kind
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            data_kinds: &[DataKind::Quote, DataKind::Historical, DataKind::Indicator],
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
            info!("Alpha Vantage running in demo mode, synthesizing quote for {}", symbol);
            return Ok(self.synthetic.quote(symbol));
        }

        debug!("Fetching latest quote for {} from Alpha Vantage", symbol);
        let params = [("function", "GLOBAL_QUOTE"), ("symbol", symbol)];
        let text = self.fetch(&params).await?;
        Self::parse_global_quote(&text, symbol)
    }

    async fn get_historical(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        if !self.has_credentials() {
            return Err(Self::missing_credentials());
        }

        let function = Self::function_for(interval);
        let mut params = vec![
            ("function", function),
            ("symbol", symbol),
            ("outputsize", "compact"),
        ];
        if interval.is_intraday() {
            params.push(("interval", interval.as_str()));
        }

        let text = self.fetch(&params).await?;
        let points = Self::parse_time_series(&text, symbol)?;

        debug!(
            "Alpha Vantage: fetched {} {} bars for {}",
            points.len(),
            interval,
            symbol
        );

        Ok(points)
    }

    async fn get_indicator(
        &self,
        symbol: &str,
        kind: IndicatorKind,
    ) -> Result<Vec<IndicatorPoint>, MarketDataError> {
        if !self.has_credentials() {
            return Err(Self::missing_credentials());
        }

        let period = kind.time_period().map(|p| p.to_string());
        let (fast, slow, signal) = (
            MACD_PERIODS.0.to_string(),
            MACD_PERIODS.1.to_string(),
            MACD_PERIODS.2.to_string(),
        );

        let mut params = vec![
            ("function", kind.function()),
            ("symbol", symbol),
            ("interval", "daily"),
            ("series_type", "close"),
        ];
        match period {
            Some(ref p) => params.push(("time_period", p.as_str())),
            None => {
                params.push(("fastperiod", fast.as_str()));
                params.push(("slowperiod", slow.as_str()));
                params.push(("signalperiod", signal.as_str()));
            }
        }

        let text = self.fetch(&params).await?;
        let points = Self::parse_indicator(&text, symbol, kind)?;

        debug!(
            "Alpha Vantage: fetched {} {} points for {}",
            points.len(),
            kind,
            symbol
        );

        Ok(points)
    }
}
