use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::SYNTHETIC_SOURCE;

/// Market data quote, normalized across providers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// Absolute change versus the previous close
    pub change: Decimal,

    /// Change in percent versus the previous close
    pub change_percent: Decimal,

    /// Trading volume (not every provider reports it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,

    pub high: Decimal,
    pub low: Decimal,
    pub open: Decimal,
    pub previous_close: Decimal,

    /// Quote time, epoch millis on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Provenance (ALPHA_VANTAGE, FINNHUB, POLYGON, or "Demo Data")
    pub source: String,
}

impl Quote {
    /// Whether this quote was synthesized rather than fetched.
    pub fn is_synthetic(&self) -> bool {
        self.source == SYNTHETIC_SOURCE
    }
}

/// `change / previous_close * 100`, or zero when there is no previous close.
pub fn change_percent(change: Decimal, previous_close: Decimal) -> Decimal {
    if previous_close.is_zero() {
        return Decimal::ZERO;
    }
    change
        .checked_div(previous_close)
        .map(|ratio| ratio * Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Quote {
        Quote {
            symbol: "AAPL".to_string(),
            price: dec!(150.25),
            change: dec!(1.50),
            change_percent: change_percent(dec!(1.50), dec!(148.75)),
            volume: Some(1_000_000),
            high: dec!(152.00),
            low: dec!(148.50),
            open: dec!(149.00),
            previous_close: dec!(148.75),
            timestamp: DateTime::from_timestamp_millis(1_704_067_200_000).unwrap(),
            source: "FINNHUB".to_string(),
        }
    }

    #[test]
    fn test_change_percent() {
        assert_eq!(change_percent(dec!(5), dec!(100)), dec!(5));
        assert_eq!(change_percent(dec!(-2.5), dec!(50)), dec!(-5));
        assert_eq!(change_percent(dec!(1), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_serializes_camel_case_with_millis() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["timestamp"], 1_704_067_200_000i64);
        assert!(json.get("changePercent").is_some());
        assert!(json.get("previousClose").is_some());
        assert_eq!(json["source"], "FINNHUB");
    }

    #[test]
    fn test_volume_omitted_when_missing() {
        let mut quote = sample();
        quote.volume = None;
        let json = serde_json::to_value(quote).unwrap();
        assert!(json.get("volume").is_none());
    }

    #[test]
    fn test_is_synthetic() {
        let mut quote = sample();
        assert!(!quote.is_synthetic());
        quote.source = SYNTHETIC_SOURCE.to_string();
        assert!(quote.is_synthetic());
    }
}
