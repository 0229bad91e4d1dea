//! Provider capabilities and rate limiting configuration.

use std::time::Duration;

use crate::models::DataKind;

/// Describes what a market data provider can serve.
///
/// Used by the registry to build the per-kind fallback order.
#[derive(Clone, Debug)]
pub struct ProviderCapabilities {
    /// Data kinds this provider answers (quote, historical, indicator).
    pub data_kinds: &'static [DataKind],
}

impl ProviderCapabilities {
    pub fn supports(&self, kind: DataKind) -> bool {
        self.data_kinds.contains(&kind)
    }
}

/// Rate limiting configuration for a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Minimum delay between two calls to the provider.
    pub min_interval: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
        }
    }
}
