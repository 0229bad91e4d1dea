use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One OHLCV bar of a historical series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Bar interval for historical requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1min")]
    OneMinute,
    #[default]
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "60min")]
    Hourly,
    #[serde(rename = "daily")]
    Daily,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::Hourly => "60min",
            Interval::Daily => "daily",
        }
    }

    /// Nominal bar length.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::OneMinute => Duration::from_secs(60),
            Interval::FiveMinutes => Duration::from_secs(5 * 60),
            Interval::FifteenMinutes => Duration::from_secs(15 * 60),
            Interval::ThirtyMinutes => Duration::from_secs(30 * 60),
            Interval::Hourly => Duration::from_secs(60 * 60),
            Interval::Daily => Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Interval::Daily)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1min" => Ok(Interval::OneMinute),
            "5min" => Ok(Interval::FiveMinutes),
            "15min" => Ok(Interval::FifteenMinutes),
            "30min" => Ok(Interval::ThirtyMinutes),
            "60min" | "1h" => Ok(Interval::Hourly),
            "daily" | "1d" => Ok(Interval::Daily),
            other => Err(format!("Unknown interval: {}", other)),
        }
    }
}

/// Sort a series ascending by timestamp and drop duplicate timestamps,
/// keeping the last occurrence.
pub fn normalize_series(mut points: Vec<HistoricalPoint>) -> Vec<HistoricalPoint> {
    // Stable sort keeps input order among equal timestamps.
    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let mut out: Vec<HistoricalPoint> = Vec::with_capacity(points.len());
    for point in points {
        match out.last_mut() {
            Some(last) if last.timestamp == point.timestamp => *last = point,
            _ => out.push(point),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn point(ts_secs: i64, close: Decimal) -> HistoricalPoint {
        HistoricalPoint {
            timestamp: DateTime::from_timestamp(ts_secs, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
        }
    }

    #[test]
    fn test_normalize_sorts_and_dedups() {
        let series = normalize_series(vec![
            point(300, dec!(3)),
            point(100, dec!(1)),
            point(200, dec!(2)),
            point(100, dec!(1.5)),
        ]);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].timestamp.timestamp(), 100);
        assert_eq!(series[0].close, dec!(1.5));
        assert_eq!(series[2].timestamp.timestamp(), 300);
    }

    #[test]
    fn test_interval_round_trip_strings() {
        for interval in [
            Interval::OneMinute,
            Interval::FiveMinutes,
            Interval::FifteenMinutes,
            Interval::ThirtyMinutes,
            Interval::Hourly,
            Interval::Daily,
        ] {
            assert_eq!(interval.as_str().parse::<Interval>().unwrap(), interval);
        }
        assert!("weekly".parse::<Interval>().is_err());
    }

    #[test]
    fn test_interval_duration() {
        assert_eq!(Interval::FiveMinutes.duration(), Duration::from_secs(300));
        assert!(Interval::Hourly.is_intraday());
        assert!(!Interval::Daily.is_intraday());
    }
}
