//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Provider capabilities and rate limiting configuration
//! - Concrete provider implementations (Alpha Vantage, Finnhub, Polygon)
//!
//! # Architecture
//!
//! Providers only translate vendor responses into normalized records. Ordering,
//! pacing and validation live in the registry; caching and synthetic fallback
//! live in the service.

mod capabilities;
mod traits;

pub mod alpha_vantage;
pub mod finnhub;
pub mod polygon;

// Re-exports
pub use capabilities::{ProviderCapabilities, RateLimit};
pub use traits::MarketDataProvider;
