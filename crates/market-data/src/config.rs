//! Runtime configuration for the market data service.
//!
//! Everything is read once at startup. Reconfiguring means building a new
//! [`MarketDataConfig`] and a new service from it.

use std::time::Duration;

use log::{debug, warn};

use crate::models::DataKind;
use crate::provider::{alpha_vantage, finnhub, polygon};

/// Default request timeout for provider HTTP calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Symbols tracked by the refresh loop when none are configured.
pub const DEFAULT_SYMBOLS: &[&str] = &["SPY", "QQQ", "DIA", "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA"];

/// Whether an API key is a placeholder rather than a real credential.
///
/// Empty keys, `demo`, and template values such as `YOUR_API_KEY` all count.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() || key.eq_ignore_ascii_case("demo") {
        return true;
    }
    let upper = key.to_uppercase();
    upper.starts_with("YOUR_") || upper.starts_with("YOUR-") || upper == "API_KEY"
}

/// Connection settings for one provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub min_interval: Duration,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            min_interval,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn alpha_vantage(api_key: impl Into<String>) -> Self {
        Self::new(api_key, alpha_vantage::BASE_URL, alpha_vantage::MIN_INTERVAL)
    }

    pub fn finnhub(api_key: impl Into<String>) -> Self {
        Self::new(api_key, finnhub::BASE_URL, finnhub::MIN_INTERVAL)
    }

    pub fn polygon(api_key: impl Into<String>) -> Self {
        Self::new(api_key, polygon::BASE_URL, polygon::MIN_INTERVAL)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_credentials(&self) -> bool {
        !is_placeholder_key(&self.api_key)
    }
}

/// Cache time-to-live per data kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheTtls {
    pub quote: Duration,
    pub historical: Duration,
    pub indicator: Duration,
}

impl CacheTtls {
    pub fn for_kind(&self, kind: DataKind) -> Duration {
        match kind {
            DataKind::Quote => self.quote,
            DataKind::Historical => self.historical,
            DataKind::Indicator => self.indicator,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(60),
            historical: Duration::from_secs(5 * 60),
            indicator: Duration::from_secs(5 * 60),
        }
    }
}

/// Refresh loop cadence and tracked symbols.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshConfig {
    pub symbols: Vec<String>,
    /// Cycle spacing while the market is open.
    pub open_interval: Duration,
    /// Cycle spacing while the market is closed.
    pub closed_interval: Duration,
    /// Pause between two symbols within one cycle.
    pub symbol_delay: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            open_interval: Duration::from_secs(30),
            closed_interval: Duration::from_secs(5 * 60),
            symbol_delay: Duration::from_secs(1),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketDataConfig {
    pub alpha_vantage: ProviderConfig,
    pub finnhub: ProviderConfig,
    pub polygon: ProviderConfig,
    pub cache: CacheTtls,
    pub refresh: RefreshConfig,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            alpha_vantage: ProviderConfig::alpha_vantage("demo"),
            finnhub: ProviderConfig::finnhub("demo"),
            polygon: ProviderConfig::polygon("demo"),
            cache: CacheTtls::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl MarketDataConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = |key_var: &str, url_var: &str, base: ProviderConfig| {
            let mut config = base;
            if let Some(key) = var(key_var) {
                config.api_key = key.trim().to_string();
            }
            if let Some(url) = var(url_var) {
                config.base_url = url.trim().trim_end_matches('/').to_string();
            }
            if !config.has_credentials() {
                debug!("{} not set, provider runs without credentials", key_var);
            }
            config
        };

        let secs = |name: &str, default: Duration| match var(name) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(value) => Duration::from_secs(value),
                Err(_) => {
                    warn!("Ignoring invalid {}={:?}", name, raw);
                    default
                }
            },
            None => default,
        };

        let symbols = var("LIVETRADER_SYMBOLS")
            .map(|raw| parse_symbols(&raw))
            .filter(|symbols| !symbols.is_empty())
            .unwrap_or(defaults.refresh.symbols);

        let symbol_delay = match var("LIVETRADER_SYMBOL_DELAY_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!("Ignoring invalid LIVETRADER_SYMBOL_DELAY_MS={:?}", raw);
                    defaults.refresh.symbol_delay
                }
            },
            None => defaults.refresh.symbol_delay,
        };

        Self {
            alpha_vantage: provider(
                "ALPHA_VANTAGE_API_KEY",
                "ALPHA_VANTAGE_BASE_URL",
                defaults.alpha_vantage,
            ),
            finnhub: provider("FINNHUB_API_KEY", "FINNHUB_BASE_URL", defaults.finnhub),
            polygon: provider("POLYGON_API_KEY", "POLYGON_BASE_URL", defaults.polygon),
            cache: CacheTtls {
                quote: secs("LIVETRADER_QUOTE_TTL_SECS", defaults.cache.quote),
                historical: secs("LIVETRADER_HISTORICAL_TTL_SECS", defaults.cache.historical),
                indicator: secs("LIVETRADER_INDICATOR_TTL_SECS", defaults.cache.indicator),
            },
            refresh: RefreshConfig {
                symbols,
                open_interval: defaults.refresh.open_interval,
                closed_interval: defaults.refresh.closed_interval,
                symbol_delay,
            },
        }
    }
}

/// Split a comma separated symbol list, upper-casing and dropping blanks.
fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_placeholder_keys() {
        assert!(is_placeholder_key(""));
        assert!(is_placeholder_key("  "));
        assert!(is_placeholder_key("demo"));
        assert!(is_placeholder_key("DEMO"));
        assert!(is_placeholder_key("YOUR_API_KEY"));
        assert!(is_placeholder_key("your_finnhub_key"));
        assert!(!is_placeholder_key("c9a1b2d3e4f5"));
    }

    #[test]
    fn test_defaults_without_env() {
        let config = MarketDataConfig::from_lookup(|_| None);
        assert_eq!(config, MarketDataConfig::default());
        assert!(!config.alpha_vantage.has_credentials());
        assert_eq!(config.alpha_vantage.base_url, alpha_vantage::BASE_URL);
        assert_eq!(config.cache.quote, Duration::from_secs(60));
        assert_eq!(config.refresh.symbols.len(), DEFAULT_SYMBOLS.len());
    }

    #[test]
    fn test_env_overrides() {
        let config = MarketDataConfig::from_lookup(lookup(&[
            ("ALPHA_VANTAGE_API_KEY", "real-key"),
            ("FINNHUB_BASE_URL", "http://localhost:9000/api/v1/"),
            ("LIVETRADER_QUOTE_TTL_SECS", "30"),
            ("LIVETRADER_SYMBOLS", "aapl, nvda,,"),
            ("LIVETRADER_SYMBOL_DELAY_MS", "250"),
        ]));

        assert!(config.alpha_vantage.has_credentials());
        assert_eq!(config.alpha_vantage.api_key, "real-key");
        assert_eq!(config.finnhub.base_url, "http://localhost:9000/api/v1");
        assert!(!config.finnhub.has_credentials());
        assert_eq!(config.cache.quote, Duration::from_secs(30));
        assert_eq!(config.cache.historical, Duration::from_secs(300));
        assert_eq!(config.refresh.symbols, vec!["AAPL", "NVDA"]);
        assert_eq!(config.refresh.symbol_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = MarketDataConfig::from_lookup(lookup(&[
            ("LIVETRADER_INDICATOR_TTL_SECS", "five"),
            ("LIVETRADER_SYMBOLS", " , "),
        ]));
        assert_eq!(config.cache.indicator, Duration::from_secs(300));
        assert_eq!(config.refresh.symbols.len(), DEFAULT_SYMBOLS.len());
    }

    #[test]
    fn test_ttl_for_kind() {
        let ttls = CacheTtls::default();
        assert_eq!(ttls.for_kind(DataKind::Quote), Duration::from_secs(60));
        assert_eq!(ttls.for_kind(DataKind::Indicator), Duration::from_secs(300));
    }
}
