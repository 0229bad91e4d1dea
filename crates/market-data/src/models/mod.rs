//! Market data models
//!
//! - `types` - Provider identifiers, data kinds and the synthetic source tag
//! - `quote` - Normalized real-time quote
//! - `historical` - OHLCV bars and bar intervals
//! - `indicator` - Technical indicator kinds and points

mod historical;
mod indicator;
mod quote;
mod types;

pub use historical::{normalize_series, HistoricalPoint, Interval};
pub use indicator::{
    latest_first, IndicatorKind, IndicatorPoint, IndicatorValue, MACD_PERIODS,
    MAX_INDICATOR_POINTS,
};
pub use quote::{change_percent, Quote};
pub use types::{DataKind, ProviderId, SYNTHETIC_SOURCE};
