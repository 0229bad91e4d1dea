//! Shared mock providers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal_macros::dec;

use livetrader_market_data::{
    CacheTtls, DataKind, HistoricalPoint, IndicatorKind, IndicatorPoint, IndicatorValue, Interval,
    MarketDataError, MarketDataProvider, MarketDataService, ProviderCapabilities, ProviderRegistry,
    Quote, RateLimit, SyntheticGenerator,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    NoData,
    Fail,
}

pub struct MockProvider {
    pub id: &'static str,
    pub priority: u8,
    pub kinds: &'static [DataKind],
    pub behavior: Behavior,
    pub min_interval: Duration,
    /// Number of indicator points returned on success.
    pub indicator_points: usize,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(id: &'static str, priority: u8, behavior: Behavior) -> Self {
        Self {
            id,
            priority,
            kinds: &[DataKind::Quote, DataKind::Historical, DataKind::Indicator],
            behavior,
            min_interval: Duration::ZERO,
            indicator_points: 10,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_indicator_points(mut self, count: usize) -> Self {
        self.indicator_points = count;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, symbol: &str) -> Result<(), MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::NoData => Err(MarketDataError::NoData {
                provider: self.id.to_string(),
                symbol: symbol.to_string(),
            }),
            Behavior::Fail => Err(MarketDataError::ProviderError {
                provider: self.id.to_string(),
                message: "HTTP 500 Internal Server Error".to_string(),
            }),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            data_kinds: self.kinds,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            min_interval: self.min_interval,
        }
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.record(symbol)?;
        Ok(Quote {
            symbol: symbol.to_string(),
            price: dec!(210),
            change: dec!(10),
            change_percent: dec!(5),
            volume: Some(42_000),
            high: dec!(212),
            low: dec!(199),
            open: dec!(201),
            previous_close: dec!(200),
            timestamp: Utc::now(),
            source: self.id.to_string(),
        })
    }

    async fn get_historical(
        &self,
        symbol: &str,
        _interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        self.record(symbol)?;
        let now = Utc::now();
        Ok((0..3)
            .rev()
            .map(|i| HistoricalPoint {
                timestamp: now - ChronoDuration::minutes(5 * i),
                open: dec!(10),
                high: dec!(11),
                low: dec!(9),
                close: dec!(10.5),
                volume: 100,
            })
            .collect())
    }

    async fn get_indicator(
        &self,
        symbol: &str,
        _kind: IndicatorKind,
    ) -> Result<Vec<IndicatorPoint>, MarketDataError> {
        self.record(symbol)?;
        let now = Utc::now();
        // Oldest first, the way vendors usually list them
        Ok((0..self.indicator_points as i64)
            .rev()
            .map(|i| IndicatorPoint {
                timestamp: now - ChronoDuration::days(i),
                value: IndicatorValue::Single {
                    value: dec!(50),
                },
            })
            .collect())
    }
}

/// Build a service over the given mocks with default TTLs.
pub fn service(providers: &[Arc<MockProvider>]) -> MarketDataService {
    service_with_ttls(providers, CacheTtls::default())
}

pub fn service_with_ttls(providers: &[Arc<MockProvider>], ttls: CacheTtls) -> MarketDataService {
    let providers: Vec<Arc<dyn MarketDataProvider>> = providers
        .iter()
        .map(|p| Arc::clone(p) as Arc<dyn MarketDataProvider>)
        .collect();
    MarketDataService::with_registry(
        ProviderRegistry::new(providers),
        ttls,
        Arc::new(SyntheticGenerator::with_seed(99)),
    )
}
