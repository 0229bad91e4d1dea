use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of points kept in an indicator result set.
pub const MAX_INDICATOR_POINTS: usize = 100;

/// Supported technical indicators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    Rsi,
    Sma,
    Ema,
    Macd,
}

impl IndicatorKind {
    /// Vendor function name (Alpha Vantage naming).
    pub fn function(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Macd => "MACD",
        }
    }

    /// Default look-back period for single-value indicators.
    pub fn time_period(&self) -> Option<u32> {
        match self {
            IndicatorKind::Rsi => Some(14),
            IndicatorKind::Sma | IndicatorKind::Ema => Some(20),
            IndicatorKind::Macd => None,
        }
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.function())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RSI" => Ok(IndicatorKind::Rsi),
            "SMA" => Ok(IndicatorKind::Sma),
            "EMA" => Ok(IndicatorKind::Ema),
            "MACD" => Ok(IndicatorKind::Macd),
            other => Err(format!("Unknown indicator: {}", other)),
        }
    }
}

/// MACD default parameters: (fast, slow, signal).
pub const MACD_PERIODS: (u32, u32, u32) = (12, 26, 9);

/// Indicator-specific payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    /// RSI, SMA, EMA
    Single { value: Decimal },
    /// MACD line, signal line, histogram
    Macd {
        macd: Decimal,
        signal: Decimal,
        histogram: Decimal,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub value: IndicatorValue,
}

/// Sort most recent first and keep at most [`MAX_INDICATOR_POINTS`].
///
/// Indicator sets are newest-first, unlike historical series.
pub fn latest_first(mut points: Vec<IndicatorPoint>) -> Vec<IndicatorPoint> {
    points.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    points.truncate(MAX_INDICATOR_POINTS);
    points
}
