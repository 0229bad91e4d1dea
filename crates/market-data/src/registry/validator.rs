//! Quote data validation.
//!
//! Validates provider data before it is cached:
//! - Prices must be positive
//! - OHLC invariants (high >= low; open/price inside the range is a warning)
//! - Change fields should agree with the previous close
//! - Reasonable value ranges

use log::warn;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{change_percent, HistoricalPoint, Quote};

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - reject the record, try next provider.
    Hard,
    /// Soft warning - accept the record but log a warning.
    Soft,
}

/// Validation result details.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: ValidationSeverity,
    /// Description of the issue.
    pub message: String,
}

/// Quote validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Whether to reject zero or negative prices.
    pub reject_non_positive_prices: bool,
    /// Whether to reject records where high < low.
    pub reject_invalid_ohlc: bool,
    /// Maximum plausible price (sanity check, warning only).
    pub max_price: Option<Decimal>,
    /// Allowed gap between the reported percent change and the one derived
    /// from `change / previous_close`.
    pub change_percent_tolerance: Decimal,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reject_non_positive_prices: true,
            reject_invalid_ohlc: true,
            max_price: Some(Decimal::from(1_000_000_000i64)), // 1 billion as sanity check
            change_percent_tolerance: Decimal::new(1, 2),     // 0.01 percentage points
        }
    }
}

/// Quote data validator.
pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    /// Create a new validator with default configuration.
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    /// Create a validator with custom configuration.
    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a quote.
    ///
    /// Returns Ok(()) if the quote is usable. Warnings are logged but do not
    /// cause rejection.
    pub fn validate(&self, quote: &Quote) -> Result<(), MarketDataError> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        self.validate_price(quote, &mut issues);
        self.validate_range(quote.open, quote.high, quote.low, quote.price, &mut issues);
        self.validate_change(quote, &mut issues);

        Self::finish(&quote.symbol, issues)
    }

    /// Validate one historical bar.
    pub fn validate_point(&self, point: &HistoricalPoint) -> Result<(), MarketDataError> {
        let mut issues: Vec<ValidationIssue> = Vec::new();

        if self.config.reject_non_positive_prices && point.close <= Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Non-positive close: {}", point.close),
            });
        }
        self.validate_range(point.open, point.high, point.low, point.close, &mut issues);

        Self::finish(&point.timestamp.to_rfc3339(), issues)
    }

    /// Validate a historical series, dropping bars that fail hard checks.
    ///
    /// Returns the surviving bars and the number dropped.
    pub fn validate_series(&self, points: Vec<HistoricalPoint>) -> (Vec<HistoricalPoint>, usize) {
        let original = points.len();
        let valid: Vec<HistoricalPoint> = points
            .into_iter()
            .filter(|point| self.validate_point(point).is_ok())
            .collect();
        let dropped = original - valid.len();
        (valid, dropped)
    }

    fn finish(subject: &str, issues: Vec<ValidationIssue>) -> Result<(), MarketDataError> {
        let errors: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !errors.is_empty() {
            return Err(MarketDataError::ValidationFailed {
                message: errors.join("; "),
            });
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!("Validation warning for {}: {}", subject, issue.message);
        }

        Ok(())
    }

    fn validate_price(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        if self.config.reject_non_positive_prices && quote.price <= Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Non-positive price: {}", quote.price),
            });
        }

        if let Some(max_price) = self.config.max_price {
            if quote.price > max_price {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Soft,
                    message: format!(
                        "Price ({}) exceeds max threshold ({})",
                        quote.price, max_price
                    ),
                });
            }
        }
    }

    /// High >= Low is hard; open/close outside the range is soft.
    fn validate_range(
        &self,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if !self.config.reject_invalid_ohlc {
            return;
        }

        if high < low {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("High ({}) is less than Low ({})", high, low),
            });
            return;
        }

        if open < low || open > high {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!("Open ({}) is outside High/Low range ({}-{})", open, low, high),
            });
        }

        if close < low || close > high {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!(
                    "Close ({}) is outside High/Low range ({}-{})",
                    close, low, high
                ),
            });
        }
    }

    fn validate_change(&self, quote: &Quote, issues: &mut Vec<ValidationIssue>) {
        let expected = change_percent(quote.change, quote.previous_close);
        if (quote.change_percent - expected).abs() > self.config.change_percent_tolerance {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!(
                    "Change percent ({}) disagrees with change/previous close ({})",
                    quote.change_percent, expected
                ),
            });
        }
    }
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn make_quote(price: Decimal) -> Quote {
        Quote {
            symbol: "TEST".to_string(),
            price,
            change: dec!(5),
            change_percent: dec!(5),
            volume: Some(1000),
            high: dec!(110),
            low: dec!(95),
            open: dec!(100),
            previous_close: dec!(100),
            timestamp: Utc::now(),
            source: "TEST".to_string(),
        }
    }

    fn make_point(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> HistoricalPoint {
        HistoricalPoint {
            timestamp: Utc::now(),
            open,
            high,
            low,
            close,
            volume: 10,
        }
    }

    #[test]
    fn test_valid_quote() {
        let validator = QuoteValidator::new();
        assert!(validator.validate(&make_quote(dec!(105))).is_ok());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let validator = QuoteValidator::new();

        for price in [dec!(0), dec!(-10)] {
            let result = validator.validate(&make_quote(price));
            match result {
                Err(MarketDataError::ValidationFailed { message }) => {
                    assert!(message.contains("Non-positive price"))
                }
                other => panic!("expected validation failure, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_high_less_than_low_rejected() {
        let validator = QuoteValidator::new();
        let mut quote = make_quote(dec!(100));
        quote.high = dec!(90);
        quote.low = dec!(95);

        let result = validator.validate(&quote);
        assert!(matches!(result, Err(MarketDataError::ValidationFailed { .. })));
    }

    #[test]
    fn test_price_outside_range_only_warns() {
        let validator = QuoteValidator::new();
        let mut quote = make_quote(dec!(120));
        quote.change = dec!(20);
        quote.change_percent = dec!(20);
        assert!(validator.validate(&quote).is_ok());
    }

    #[test]
    fn test_inconsistent_change_only_warns() {
        let validator = QuoteValidator::new();
        let mut quote = make_quote(dec!(105));
        quote.change_percent = dec!(42);
        assert!(validator.validate(&quote).is_ok());
    }

    #[test]
    fn test_custom_config_allows_zero() {
        let validator = QuoteValidator::with_config(ValidatorConfig {
            reject_non_positive_prices: false,
            ..Default::default()
        });
        assert!(validator.validate(&make_quote(dec!(0))).is_ok());
    }

    #[test]
    fn test_series_drops_invalid_bars() {
        let validator = QuoteValidator::new();
        let series = vec![
            make_point(dec!(10), dec!(11), dec!(9), dec!(10.5)),
            make_point(dec!(10), dec!(9), dec!(11), dec!(10)), // high < low
            make_point(dec!(10), dec!(11), dec!(9), dec!(0)),  // zero close
            make_point(dec!(10), dec!(12), dec!(9), dec!(11)),
        ];

        let (valid, dropped) = validator.validate_series(series);
        assert_eq!(valid.len(), 2);
        assert_eq!(dropped, 2);
    }
}
