//! LiveTrader Market Data Crate
//!
//! This crate fetches quotes, historical bars and technical indicators from
//! third-party financial APIs for the LiveTrader dashboard.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Multiple providers: Alpha Vantage, Finnhub, Polygon
//! - Per-provider call pacing and priority-ordered fallback
//! - In-memory TTL caching per data kind
//! - Synthetic demo data when no provider can answer
//! - A market-hours aware refresh loop publishing through [`QuoteSink`]
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  QuoteRefresher  | --> | MarketDataService|  (cache, synthetic fallback)
//! +------------------+     +------------------+
//!         |                        |
//!         v                        v
//! +------------------+     +------------------+
//! |    QuoteSink     |     | ProviderRegistry |  (ordering, pacing, validation)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    Provider      |  (Alpha Vantage, Finnhub, Polygon)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - Latest price with change, range and provenance
//! - [`HistoricalPoint`] - One OHLCV bar
//! - [`IndicatorPoint`] - One RSI/SMA/EMA/MACD value
//! - [`MarketDataService`] - Entry point; never returns an error
//! - [`MarketDataConfig`] - Keys, endpoints, TTLs and refresh settings

pub mod cache;
pub mod config;
pub mod errors;
pub mod market_clock;
pub mod models;
pub mod provider;
pub mod refresh;
pub mod registry;
pub mod service;
pub mod synthetic;

// Re-export all public types from models
pub use models::{
    DataKind, HistoricalPoint, IndicatorKind, IndicatorPoint, IndicatorValue, Interval,
    ProviderId, Quote, SYNTHETIC_SOURCE,
};

pub use cache::{CacheKey, Lookup, TtlCache};
pub use config::{CacheTtls, MarketDataConfig, ProviderConfig, RefreshConfig};
pub use errors::MarketDataError;
pub use market_clock::MarketClock;
pub use refresh::{ChannelSink, QuoteRefresher, QuoteSink, QuoteUpdate, RefreshHandle};
pub use service::MarketDataService;
pub use synthetic::SyntheticGenerator;

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::polygon::PolygonProvider;
pub use provider::{MarketDataProvider, ProviderCapabilities, RateLimit};

// Re-export registry types
pub use registry::{ProviderRegistry, QuoteValidator, RateLimiter, ValidationSeverity};
