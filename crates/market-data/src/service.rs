//! Market data service: cache, provider fallback and synthetic substitution.
//!
//! Every request follows the same path:
//!
//! ```text
//! cache (valid hit) -> return
//!        |
//!        v
//! registry (providers in priority order) -> success -> cache write -> return
//!        |
//!        v
//! synthetic data (not cached) -> return
//! ```
//!
//! None of the request methods can fail.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::cache::{CacheKey, Lookup, TtlCache};
use crate::config::{CacheTtls, MarketDataConfig};
use crate::models::{
    latest_first, DataKind, HistoricalPoint, IndicatorKind, IndicatorPoint, Interval, Quote,
};
use crate::provider::alpha_vantage::AlphaVantageProvider;
use crate::provider::finnhub::FinnhubProvider;
use crate::provider::polygon::PolygonProvider;
use crate::provider::MarketDataProvider;
use crate::registry::ProviderRegistry;
use crate::synthetic::SyntheticGenerator;

/// Normalize user input to the form used in cache keys and provider calls.
fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Market data facade shared by the refresh loop and any other consumer.
///
/// Construct once at the composition root and share through `Arc`.
pub struct MarketDataService {
    registry: ProviderRegistry,
    quotes: TtlCache<CacheKey, Quote>,
    historical: TtlCache<CacheKey, Vec<HistoricalPoint>>,
    indicators: TtlCache<CacheKey, Vec<IndicatorPoint>>,
    ttls: CacheTtls,
    synthetic: Arc<SyntheticGenerator>,
    symbol_delay: Duration,
}

impl MarketDataService {
    /// Build the service with the three stock providers.
    pub fn new(config: &MarketDataConfig) -> Self {
        let synthetic = Arc::new(SyntheticGenerator::new());
        let providers = Self::default_providers(config, Arc::clone(&synthetic));

        info!(
            "Market data service starting with {} providers ({} with credentials)",
            providers.len(),
            providers.iter().filter(|p| p.has_credentials()).count()
        );

        Self::with_registry(ProviderRegistry::new(providers), config.cache.clone(), synthetic)
            .with_symbol_delay(config.refresh.symbol_delay)
    }

    /// Build the service around an existing registry.
    pub fn with_registry(
        registry: ProviderRegistry,
        ttls: CacheTtls,
        synthetic: Arc<SyntheticGenerator>,
    ) -> Self {
        Self {
            registry,
            quotes: TtlCache::new(),
            historical: TtlCache::new(),
            indicators: TtlCache::new(),
            ttls,
            synthetic,
            symbol_delay: Duration::ZERO,
        }
    }

    /// Pause inserted between symbols by [`MarketDataService::get_quotes`].
    pub fn with_symbol_delay(mut self, delay: Duration) -> Self {
        self.symbol_delay = delay;
        self
    }

    /// Alpha Vantage, Finnhub and Polygon, configured from `config`.
    pub fn default_providers(
        config: &MarketDataConfig,
        synthetic: Arc<SyntheticGenerator>,
    ) -> Vec<Arc<dyn MarketDataProvider>> {
        let alpha_vantage: Arc<dyn MarketDataProvider> = Arc::new(AlphaVantageProvider::new(
            config.alpha_vantage.clone(),
            synthetic,
        ));
        let finnhub: Arc<dyn MarketDataProvider> =
            Arc::new(FinnhubProvider::new(config.finnhub.clone()));
        let polygon: Arc<dyn MarketDataProvider> =
            Arc::new(PolygonProvider::new(config.polygon.clone()));

        vec![alpha_vantage, finnhub, polygon]
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Latest quote for a symbol. Never fails: falls back to synthetic data.
    pub async fn get_real_time_quote(&self, symbol: &str) -> Quote {
        let symbol = normalize_symbol(symbol);
        let key = CacheKey::quote(&symbol);

        if let Some(quote) = self.quotes.get_valid(&key, self.ttls.quote) {
            debug!("Cache hit for {}", key.as_str());
            return quote;
        }

        match self.registry.fetch_quote(&symbol).await {
            Ok(quote) => {
                self.quotes.put(key, quote.clone());
                quote
            }
            Err(e) => {
                info!("Using synthetic quote for {}: {}", symbol, e);
                self.synthetic.quote(&symbol)
            }
        }
    }

    /// Historical bars, ascending. Never fails: falls back to synthetic data.
    pub async fn get_historical_data(&self, symbol: &str, interval: Interval) -> Vec<HistoricalPoint> {
        let symbol = normalize_symbol(symbol);
        let key = CacheKey::historical(&symbol, interval);

        if let Some(points) = self.historical.get_valid(&key, self.ttls.historical) {
            debug!("Cache hit for {}", key.as_str());
            return points;
        }

        match self.registry.fetch_historical(&symbol, interval).await {
            Ok(points) => {
                self.historical.put(key, points.clone());
                points
            }
            Err(e) => {
                info!("Using synthetic {} series for {}: {}", interval, symbol, e);
                self.synthetic.historical(&symbol)
            }
        }
    }

    /// Indicator points, most recent first, at most 100.
    /// Never fails: falls back to synthetic data.
    pub async fn get_technical_indicators(
        &self,
        symbol: &str,
        kind: IndicatorKind,
    ) -> Vec<IndicatorPoint> {
        let symbol = normalize_symbol(symbol);
        let key = CacheKey::indicator(&symbol, kind);

        if let Some(points) = self.indicators.get_valid(&key, self.ttls.indicator) {
            debug!("Cache hit for {}", key.as_str());
            return points;
        }

        match self.registry.fetch_indicator(&symbol, kind).await {
            Ok(points) => {
                let points = latest_first(points);
                self.indicators.put(key, points.clone());
                points
            }
            Err(e) => {
                info!("Using synthetic {} for {}: {}", kind, symbol, e);
                self.synthetic.indicator(&symbol, kind)
            }
        }
    }

    /// Quotes for several symbols, one at a time with the configured pause
    /// between them. Duplicates are fetched once.
    pub async fn get_quotes(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let mut quotes = HashMap::with_capacity(symbols.len());

        for symbol in symbols {
            let symbol = normalize_symbol(symbol);
            if quotes.contains_key(&symbol) {
                continue;
            }
            if !quotes.is_empty() && !self.symbol_delay.is_zero() {
                tokio::time::sleep(self.symbol_delay).await;
            }
            let quote = self.get_real_time_quote(&symbol).await;
            quotes.insert(symbol, quote);
        }

        quotes
    }

    /// Last cached quote regardless of age, for display while a refresh runs.
    pub fn cached_quote(&self, symbol: &str) -> Option<Lookup<Quote>> {
        let key = CacheKey::quote(&normalize_symbol(symbol));
        self.quotes.get(&key, self.ttls.for_kind(DataKind::Quote))
    }
}
