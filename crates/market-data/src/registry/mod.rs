//! Provider registry module.
//!
//! This module provides orchestration for market data providers, including:
//! - Provider registration and priority ordering
//! - Minimum-interval pacing per provider
//! - Quote data validation

mod provider_registry;
mod rate_limiter;
mod validator;

pub use provider_registry::ProviderRegistry;
pub use rate_limiter::{RateLimiter, DEFAULT_MIN_INTERVAL};
pub use validator::{QuoteValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
