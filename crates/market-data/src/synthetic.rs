//! Synthetic demo data.
//!
//! Used when no provider can answer (and by Alpha Vantage quotes when it runs
//! without credentials). Structure is fixed (counts, spacing, field
//! derivations); magnitudes are random within fixed ranges around a per-symbol
//! base price.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::models::{
    change_percent, HistoricalPoint, IndicatorKind, IndicatorPoint, IndicatorValue, Quote,
    SYNTHETIC_SOURCE,
};

/// Reference prices for the symbols the dashboard ships with.
pub const BASE_PRICES: &[(&str, i64)] = &[
    ("AAPL", 175),
    ("GOOGL", 140),
    ("MSFT", 380),
    ("AMZN", 145),
    ("TSLA", 240),
    ("NVDA", 480),
    ("META", 330),
    ("NFLX", 450),
    ("SPY", 450),
    ("QQQ", 380),
    ("DIA", 350),
    ("IWM", 190),
    ("BTC", 43000),
    ("ETH", 2300),
];

/// Base price for symbols missing from [`BASE_PRICES`].
pub const DEFAULT_BASE_PRICE: i64 = 100;

/// Number of bars in a synthetic historical series.
pub const HISTORICAL_POINTS: usize = 101;

/// Spacing between synthetic historical bars.
pub const HISTORICAL_SPACING_MINUTES: i64 = 5;

/// Number of daily points in a synthetic indicator series.
pub const INDICATOR_POINTS: usize = 51;

/// Reference price for a symbol.
pub fn base_price(symbol: &str) -> Decimal {
    let symbol = symbol.trim().to_uppercase();
    let price = BASE_PRICES
        .iter()
        .find(|(known, _)| *known == symbol)
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_BASE_PRICE);
    Decimal::from(price)
}

/// Random in `[low, high)`, rounded to cents.
fn jitter<R: Rng>(rng: &mut R, low: f64, high: f64) -> Decimal {
    let value = rng.gen_range(low..high);
    Decimal::from_f64_retain(value)
        .unwrap_or_default()
        .round_dp(2)
}

/// Generator for synthetic quotes, series and indicators.
pub struct SyntheticGenerator {
    rng: Mutex<StdRng>,
}

impl SyntheticGenerator {
    /// Generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible generator.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| {
            warn!("Synthetic generator mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn quote(&self, symbol: &str) -> Quote {
        self.quote_at(symbol, Utc::now())
    }

    /// Synthetic quote stamped at `now`.
    ///
    /// `change` is the random delta from the base price and `previous_close`
    /// is the base price, so `change_percent == change / previous_close * 100`.
    pub fn quote_at(&self, symbol: &str, now: DateTime<Utc>) -> Quote {
        let mut rng = self.lock_rng();
        let base = base_price(symbol);
        let delta = jitter(&mut *rng, -5.0, 5.0);
        let five = Decimal::from(5);

        Quote {
            symbol: symbol.trim().to_uppercase(),
            price: base + delta,
            change: delta,
            change_percent: change_percent(delta, base),
            volume: Some(rng.gen_range(0..10_000_000u64)),
            high: base + five + jitter(&mut *rng, 0.0, 5.0),
            low: base - five - jitter(&mut *rng, 0.0, 5.0),
            open: base + jitter(&mut *rng, -2.0, 2.0),
            previous_close: base,
            timestamp: now,
            source: SYNTHETIC_SOURCE.to_string(),
        }
    }

    pub fn historical(&self, symbol: &str) -> Vec<HistoricalPoint> {
        self.historical_at(symbol, Utc::now())
    }

    /// 101 bars at 5-minute spacing ending at `now`, ascending.
    ///
    /// Each close is jittered around a fresh synthetic quote price; open, high
    /// and low are independent small jitters around the close, so OHLC
    /// ordering is not guaranteed.
    pub fn historical_at(&self, symbol: &str, now: DateTime<Utc>) -> Vec<HistoricalPoint> {
        let anchor = self.quote_at(symbol, now).price;
        let mut rng = self.lock_rng();

        (0..HISTORICAL_POINTS)
            .rev()
            .map(|steps_back| {
                let timestamp =
                    now - ChronoDuration::minutes(HISTORICAL_SPACING_MINUTES * steps_back as i64);
                let close = anchor + jitter(&mut *rng, -10.0, 10.0);
                HistoricalPoint {
                    timestamp,
                    open: close + jitter(&mut *rng, -1.0, 1.0),
                    high: close + jitter(&mut *rng, 0.0, 2.0),
                    low: close - jitter(&mut *rng, 0.0, 2.0),
                    close,
                    volume: rng.gen_range(0..1_000_000u64),
                }
            })
            .collect()
    }

    pub fn indicator(&self, symbol: &str, kind: IndicatorKind) -> Vec<IndicatorPoint> {
        self.indicator_at(symbol, kind, Utc::now())
    }

    /// 51 daily points ending at `now`, most recent first.
    pub fn indicator_at(
        &self,
        symbol: &str,
        kind: IndicatorKind,
        now: DateTime<Utc>,
    ) -> Vec<IndicatorPoint> {
        let base = base_price(symbol);
        let mut rng = self.lock_rng();

        (0..INDICATOR_POINTS)
            .map(|days_back| {
                let timestamp = now - ChronoDuration::days(days_back as i64);
                let value = match kind {
                    IndicatorKind::Rsi => IndicatorValue::Single {
                        value: jitter(&mut *rng, 30.0, 70.0),
                    },
                    IndicatorKind::Sma | IndicatorKind::Ema => IndicatorValue::Single {
                        value: base + jitter(&mut *rng, -10.0, 10.0),
                    },
                    IndicatorKind::Macd => IndicatorValue::Macd {
                        macd: jitter(&mut *rng, -2.0, 2.0),
                        signal: jitter(&mut *rng, -2.0, 2.0),
                        histogram: jitter(&mut *rng, -1.0, 1.0),
                    },
                };
                IndicatorPoint { timestamp, value }
            })
            .collect()
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}
