use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Provider identifier - mostly static constants
pub type ProviderId = Cow<'static, str>;

/// Source tag carried by synthetic records.
pub const SYNTHETIC_SOURCE: &str = "Demo Data";

/// The three kinds of market data, each with its own cache TTL and
/// provider priority list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Real-time quote
    Quote,
    /// Historical OHLCV series
    Historical,
    /// Technical indicator series
    Indicator,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Quote => "quote",
            DataKind::Historical => "historical",
            DataKind::Indicator => "indicator",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
