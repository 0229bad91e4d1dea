//! Error types for the market data crate.
//!
//! Provider adapters report every failure as a [`MarketDataError`]. The
//! provider registry treats any adapter error as "no data" and moves on to the
//! next provider, and the service masks total exhaustion with synthetic data,
//! so none of these errors reach callers of [`crate::MarketDataService`].

use thiserror::Error;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider answered but had nothing for the request.
    #[error("No data from {provider} for {symbol}")]
    NoData {
        /// The provider that returned an empty payload
        provider: String,
        /// The requested symbol
        symbol: String,
    },

    /// The provider is configured with a placeholder key, so no call was made.
    #[error("Missing credentials: {provider}")]
    MissingCredentials {
        /// The provider without usable credentials
        provider: String,
    },

    /// The provider does not implement the requested operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported {
        /// The unsupported operation
        operation: String,
        /// The provider that rejected it
        provider: String,
    },

    /// The provider rate limited the request (HTTP 429 or a throttling note).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred (bad status, vendor error body,
    /// unparseable payload).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// Data validation failed.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// No registered provider supports the requested data kind.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// All providers were tried and all failed.
    #[error("All providers failed")]
    AllProvidersFailed,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Build a [`MarketDataError::ProviderError`] for a parse failure.
    pub(crate) fn parse(provider: &str, what: &str, err: impl std::fmt::Display) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: format!("Failed to parse {} response: {}", what, err),
        }
    }

    /// Whether the error means "this provider had nothing" rather than a fault.
    ///
    /// Used by the registry to pick a log level.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            Self::SymbolNotFound(_)
                | Self::NoData { .. }
                | Self::MissingCredentials { .. }
                | Self::NotSupported { .. }
        )
    }
}
