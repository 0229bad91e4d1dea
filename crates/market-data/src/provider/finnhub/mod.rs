//! Finnhub market data provider implementation.
//!
//! This module provides real-time quotes from the Finnhub `/quote` endpoint.
//! It is the second choice for quotes and serves no other data kind.
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::errors::MarketDataError;
use crate::models::{change_percent, DataKind, Quote};
use crate::provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

pub const BASE_URL: &str = "https://finnhub.io/api/v1";
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Previous close
    pc: Option<f64>,
    /// Timestamp (Unix seconds)
    t: Option<i64>,
}

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub market data provider.
pub struct FinnhubProvider {
    client: Client,
    config: ProviderConfig,
}

impl FinnhubProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    /// Make a GET request to the Finnhub API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("token", self.config.api_key.as_str()));

        let url = reqwest::Url::parse_with_params(
            &format!("{}{}", self.config.base_url, endpoint),
            &all_params,
        )
        .map_err(|e| MarketDataError::ProviderError {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to build URL: {}", e),
        })?;

        debug!(
            "Finnhub request: {}",
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
            let body = response.text().await.unwrap_or_default();

            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(error_msg) = error_resp.error {
                    return Err(MarketDataError::ProviderError {
                        provider: PROVIDER_ID.to_string(),
                        message: error_msg,
                    });
                }
            }

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

    fn to_decimal(value: Option<f64>) -> Option<Decimal> {
        value.and_then(|v| Decimal::try_from(v).ok())
    }

    /// Map a /quote body to a Quote.
    fn parse_quote(text: &str, symbol: &str) -> Result<Quote, MarketDataError> {
        // Finnhub answers 200 with {"error": "..."} for some bad requests
        if let Ok(ErrorResponse { error: Some(msg) }) = serde_json::from_str::<ErrorResponse>(text)
        {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: msg,
            });
        }

        let response: QuoteResponse = serde_json::from_str(text)
            .map_err(|e| MarketDataError::parse(PROVIDER_ID, "quote", e))?;

        let current = response.c.ok_or_else(|| {
            MarketDataError::SymbolNotFound(format!("No quote data for symbol: {}", symbol))
        })?;

        // Unknown symbols come back as all zeros instead of an error
        if current == 0.0 && response.pc.unwrap_or(0.0) == 0.0 {
            return Err(MarketDataError::SymbolNotFound(format!(
                "Symbol not found or no trading data: {}",
                symbol
            )));
        }

        let price = Self::to_decimal(Some(current)).ok_or_else(|| {
            MarketDataError::ValidationFailed {
                message: format!("Invalid price: {}", current),
            }
        })?;
        let previous_close = Self::to_decimal(response.pc).unwrap_or(price);
        let change = Self::to_decimal(response.d).unwrap_or(price - previous_close);
        let percent =
            Self::to_decimal(response.dp).unwrap_or_else(|| change_percent(change, previous_close));

        let timestamp = response
            .t
            .filter(|ts| *ts > 0)
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent: percent,
            volume: None, // /quote doesn't report volume
            high: Self::to_decimal(response.h).unwrap_or(price),
            low: Self::to_decimal(response.l).unwrap_or(price),
            open: Self::to_decimal(response.o).unwrap_or(price),
            previous_close,
            timestamp,
            source: PROVIDER_ID.to_string(),
        })
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            data_kinds: &[DataKind::Quote],
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
            return Err(MarketDataError::MissingCredentials {
                provider: PROVIDER_ID.to_string(),
            });
        }

        debug!("Fetching quote for {} from Finnhub", symbol);
        let text = self.fetch("/quote", &[("symbol", symbol)]).await?;
        Self::parse_quote(&text, symbol)
    }
}
