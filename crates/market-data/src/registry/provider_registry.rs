//! Provider registry for orchestrating market data providers.
//!
//! The registry manages multiple providers, handling:
//! - Provider selection based on data kind and priority
//! - Sequential fallback to the next provider on any failure
//! - Per-provider call pacing
//! - Quote validation

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};

use super::{QuoteValidator, RateLimiter};
use crate::errors::MarketDataError;
use crate::models::{
    DataKind, HistoricalPoint, IndicatorKind, IndicatorPoint, Interval, ProviderId, Quote,
};
use crate::provider::MarketDataProvider;

/// Provider registry for orchestrating market data fetching.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    rate_limiter: RateLimiter,
    validator: QuoteValidator,
    /// User-configured priorities (provider_id -> priority).
    /// Lower values = higher priority. If not set, falls back to provider's default priority.
    custom_priorities: HashMap<String, i32>,
}

impl ProviderRegistry {
    /// Create a new provider registry.
    ///
    /// Automatically configures call pacing for each provider based on its
    /// declared `rate_limit()`.
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self::with_priorities(providers, HashMap::new())
    }

    /// Create a new provider registry with custom priorities.
    ///
    /// # Arguments
    ///
    /// * `providers` - List of market data providers
    /// * `custom_priorities` - Priorities keyed by provider id.
    ///   Lower values = higher priority.
    pub fn with_priorities(
        providers: Vec<Arc<dyn MarketDataProvider>>,
        custom_priorities: HashMap<String, i32>,
    ) -> Self {
        let rate_limiter = RateLimiter::new();

        for provider in &providers {
            let provider_id: ProviderId = Cow::Borrowed(provider.id());
            rate_limiter.configure(&provider_id, provider.rate_limit().min_interval);
        }

        Self {
            providers,
            rate_limiter,
            validator: QuoteValidator::new(),
            custom_priorities,
        }
    }

    /// Replace the validator.
    pub fn with_validator(mut self, validator: QuoteValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Get the list of registered providers.
    pub fn providers(&self) -> &[Arc<dyn MarketDataProvider>] {
        &self.providers
    }

    /// The shared call pacer.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Providers that serve `kind`, best first.
    pub fn ordered_providers(&self, kind: DataKind) -> Vec<&Arc<dyn MarketDataProvider>> {
        let mut providers: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.capabilities().supports(kind))
            .collect();

        // Stable sort keeps registration order among equal priorities
        providers.sort_by_key(|p| {
            self.custom_priorities
                .get(p.id())
                .copied()
                .unwrap_or_else(|| p.priority() as i32)
        });
        providers
    }

    /// Fetch a quote, trying providers in priority order.
    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.fetch_with_fallback(
            DataKind::Quote,
            symbol,
            |provider| async move { provider.get_quote(symbol).await },
            |quote| {
                self.validator.validate(&quote)?;
                Ok(quote)
            },
        )
        .await
    }

    /// Fetch a historical series, trying providers in priority order.
    ///
    /// Bars failing validation are dropped; a series with nothing left counts
    /// as a provider failure.
    pub async fn fetch_historical(
        &self,
        symbol: &str,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        self.fetch_with_fallback(
            DataKind::Historical,
            symbol,
            |provider| async move { provider.get_historical(symbol, interval).await },
            |points| {
                let (valid, dropped) = self.validator.validate_series(points);
                if dropped > 0 {
                    warn!("Dropped {} invalid bars for {}", dropped, symbol);
                }
                if valid.is_empty() {
                    return Err(MarketDataError::ValidationFailed {
                        message: format!("No valid bars for {}", symbol),
                    });
                }
                Ok(valid)
            },
        )
        .await
    }

    /// Fetch a technical indicator series, trying providers in priority order.
    pub async fn fetch_indicator(
        &self,
        symbol: &str,
        kind: IndicatorKind,
    ) -> Result<Vec<IndicatorPoint>, MarketDataError> {
        self.fetch_with_fallback(
            DataKind::Indicator,
            symbol,
            |provider| async move { provider.get_indicator(symbol, kind).await },
            |points| {
                if points.is_empty() {
                    return Err(MarketDataError::ValidationFailed {
                        message: format!("Empty {} series for {}", kind, symbol),
                    });
                }
                Ok(points)
            },
        )
        .await
    }

    /// Try each eligible provider in turn.
    ///
    /// Each attempt waits for the provider's pacing slot (credentialed
    /// providers only), runs to completion,
    /// and is checked by `accept`. Any error moves on to the next provider.
    async fn fetch_with_fallback<T, F, Fut, A>(
        &self,
        kind: DataKind,
        symbol: &str,
        fetch: F,
        accept: A,
    ) -> Result<T, MarketDataError>
    where
        F: Fn(Arc<dyn MarketDataProvider>) -> Fut,
        Fut: Future<Output = Result<T, MarketDataError>>,
        A: Fn(T) -> Result<T, MarketDataError>,
    {
        let providers = self.ordered_providers(kind);

        if providers.is_empty() {
            warn!("No providers available for {} data", kind);
            return Err(MarketDataError::NoProvidersAvailable);
        }

        for provider in providers {
            let provider_id: ProviderId = Cow::Borrowed(provider.id());

            // Providers without credentials never reach the network
            if provider.has_credentials() {
                self.rate_limiter.acquire(&provider_id).await;
            }
            debug!("Fetching {} for {} from '{}'", kind, symbol, provider_id);

            let result = fetch(Arc::clone(provider)).await.and_then(&accept);

            match result {
                Ok(value) => {
                    info!("Fetched {} for {} from '{}'", kind, symbol, provider_id);
                    return Ok(value);
                }
                Err(e) if e.is_no_data() => {
                    debug!(
                        "Provider '{}' has no {} for {}: {}, trying next",
                        provider_id, kind, symbol, e
                    );
                }
                Err(e) => {
                    warn!(
                        "Provider '{}' failed {} for {}: {}, trying next",
                        provider_id, kind, symbol, e
                    );
                }
            }
        }

        warn!("All providers failed {} for {}", kind, symbol);
        Err(MarketDataError::AllProvidersFailed)
    }
}
