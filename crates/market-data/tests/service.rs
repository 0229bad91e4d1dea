mod common;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use common::{service, service_with_ttls, Behavior, MockProvider};
use livetrader_market_data::models::{change_percent, MAX_INDICATOR_POINTS};
use livetrader_market_data::synthetic::{base_price, HISTORICAL_POINTS, INDICATOR_POINTS};
use livetrader_market_data::{CacheTtls, IndicatorKind, Interval, SYNTHETIC_SOURCE};

#[tokio::test(start_paused = true)]
async fn quote_satisfies_change_percent_formula() {
    let real = Arc::new(MockProvider::new("REAL", 1, Behavior::Succeed));
    let quote = service(&[real]).get_real_time_quote("AAPL").await;
    assert_eq!(
        quote.change_percent,
        change_percent(quote.change, quote.previous_close)
    );

    let none = Arc::new(MockProvider::new("NONE", 1, Behavior::NoData));
    let synthetic = service(&[none]).get_real_time_quote("AAPL").await;
    let expected = change_percent(synthetic.change, synthetic.previous_close);
    assert!((synthetic.change_percent - expected).abs() < dec!(0.0001));
}

#[tokio::test(start_paused = true)]
async fn cached_quote_skips_providers_within_ttl() {
    let provider = Arc::new(MockProvider::new("ONLY", 1, Behavior::Succeed));
    let service = service(&[provider.clone()]);

    let first = service.get_real_time_quote("AAPL").await;
    tokio::time::advance(Duration::from_secs(59)).await;
    let second = service.get_real_time_quote("aapl").await;

    assert_eq!(first, second);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_quote_is_fetched_again() {
    let provider = Arc::new(MockProvider::new("ONLY", 1, Behavior::Succeed));
    let service = service(&[provider.clone()]);

    service.get_real_time_quote("AAPL").await;
    tokio::time::advance(Duration::from_secs(60)).await;
    service.get_real_time_quote("AAPL").await;

    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn custom_ttls_apply_per_kind() {
    let provider = Arc::new(MockProvider::new("ONLY", 1, Behavior::Succeed));
    let ttls = CacheTtls {
        quote: Duration::from_secs(5),
        historical: Duration::from_secs(600),
        indicator: Duration::from_secs(600),
    };
    let service = service_with_ttls(&[provider.clone()], ttls);

    service.get_real_time_quote("MSFT").await;
    service.get_historical_data("MSFT", Interval::FiveMinutes).await;
    tokio::time::advance(Duration::from_secs(10)).await;
    service.get_real_time_quote("MSFT").await;
    service.get_historical_data("MSFT", Interval::FiveMinutes).await;

    // Quote refetched, historical served from cache
    assert_eq!(provider.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn fallback_stops_at_first_success() {
    let first = Arc::new(MockProvider::new("FIRST", 1, Behavior::NoData));
    let second = Arc::new(MockProvider::new("SECOND", 2, Behavior::Succeed));
    let third = Arc::new(MockProvider::new("THIRD", 3, Behavior::Succeed));
    let service = service(&[third.clone(), first.clone(), second.clone()]);

    let quote = service.get_real_time_quote("AAPL").await;

    assert_eq!(quote.source, "SECOND");
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(third.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn provider_errors_count_as_no_data() {
    let first = Arc::new(MockProvider::new("FIRST", 1, Behavior::Fail));
    let second = Arc::new(MockProvider::new("SECOND", 2, Behavior::Succeed));
    let service = service(&[first.clone(), second.clone()]);

    let series = service.get_historical_data("AAPL", Interval::Daily).await;
    assert_eq!(series.len(), 3);
    assert!(series.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(first.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_returns_synthetic_quote_in_range() {
    let first = Arc::new(MockProvider::new("FIRST", 1, Behavior::NoData));
    let second = Arc::new(MockProvider::new("SECOND", 2, Behavior::Fail));
    let service = service(&[first.clone(), second.clone()]);

    let quote = service.get_real_time_quote("AAPL").await;
    let base = base_price("AAPL");

    assert_eq!(quote.source, SYNTHETIC_SOURCE);
    assert!(quote.is_synthetic());
    assert!((quote.price - base).abs() <= dec!(5));
    assert_eq!(quote.change, quote.price - base);
    assert_eq!(quote.previous_close, base);
    assert!(quote.high >= base + dec!(5) && quote.high <= base + dec!(10));
    assert!(quote.low <= base - dec!(5) && quote.low >= base - dec!(10));
    assert!(quote.open >= base - dec!(2) && quote.open <= base + dec!(2));
    assert!(quote.volume.unwrap_or(0) < 10_000_000);
}

#[tokio::test(start_paused = true)]
async fn synthetic_results_are_not_cached() {
    let provider = Arc::new(MockProvider::new("NONE", 1, Behavior::NoData));
    let service = service(&[provider.clone()]);

    service.get_real_time_quote("ZZZZ").await;
    service.get_real_time_quote("ZZZZ").await;

    assert_eq!(provider.calls(), 2);
    assert!(service.cached_quote("ZZZZ").is_none());
}

#[tokio::test(start_paused = true)]
async fn exhaustion_returns_synthetic_series() {
    let provider = Arc::new(MockProvider::new("NONE", 1, Behavior::NoData));
    let service = service(&[provider]);

    let series = service.get_historical_data("SPY", Interval::FiveMinutes).await;
    assert_eq!(series.len(), HISTORICAL_POINTS);
    assert!(series.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    let points = service
        .get_technical_indicators("SPY", IndicatorKind::Rsi)
        .await;
    assert_eq!(points.len(), INDICATOR_POINTS);
}

#[tokio::test(start_paused = true)]
async fn indicators_are_latest_first_and_capped() {
    let provider = Arc::new(
        MockProvider::new("MANY", 1, Behavior::Succeed).with_indicator_points(250),
    );
    let service = service(&[provider.clone()]);

    let points = service
        .get_technical_indicators("AAPL", IndicatorKind::Sma)
        .await;

    assert_eq!(points.len(), MAX_INDICATOR_POINTS);
    assert!(points.windows(2).all(|w| w[0].timestamp > w[1].timestamp));

    // Cached copy is the trimmed one
    let again = service
        .get_technical_indicators("AAPL", IndicatorKind::Sma)
        .await;
    assert_eq!(again, points);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn indicator_kinds_are_cached_separately() {
    let provider = Arc::new(MockProvider::new("ONLY", 1, Behavior::Succeed));
    let service = service(&[provider.clone()]);

    service.get_technical_indicators("AAPL", IndicatorKind::Rsi).await;
    service.get_technical_indicators("AAPL", IndicatorKind::Ema).await;
    service.get_technical_indicators("AAPL", IndicatorKind::Rsi).await;

    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn provider_calls_respect_min_interval() {
    let provider = Arc::new(
        MockProvider::new("SLOW", 1, Behavior::Succeed).with_min_interval(Duration::from_secs(12)),
    );
    let service = service(&[provider.clone()]);

    let start = tokio::time::Instant::now();
    service.get_real_time_quote("AAPL").await;
    let after_first = start.elapsed();
    service.get_real_time_quote("MSFT").await;

    assert_eq!(after_first, Duration::ZERO);
    assert!(start.elapsed() >= Duration::from_secs(12));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn batch_quotes_are_paced_and_deduplicated() {
    let provider = Arc::new(MockProvider::new("ONLY", 1, Behavior::Succeed));
    let service = service(&[provider.clone()]).with_symbol_delay(Duration::from_secs(1));

    let symbols: Vec<String> = ["AAPL", "msft", "AAPL", "TSLA"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let start = tokio::time::Instant::now();
    let quotes = service.get_quotes(&symbols).await;

    assert_eq!(quotes.len(), 3);
    assert!(quotes.contains_key("MSFT"));
    assert_eq!(provider.calls(), 3);
    assert!(start.elapsed() >= Duration::from_secs(2));
}
