mod main_lib;

use std::sync::Arc;

use livetrader_market_data::{MarketClock, MarketDataConfig, MarketDataService, QuoteRefresher};
use main_lib::{chat_client_from_env, init_tracing, run_chat_prompt, LoggingSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = MarketDataConfig::from_env();
    let service = Arc::new(MarketDataService::new(&config));
    let clock = MarketClock::new(config.refresh.open_interval, config.refresh.closed_interval);

    tracing::info!(
        "Tracking {} symbols: {}",
        config.refresh.symbols.len(),
        config.refresh.symbols.join(", ")
    );

    let refresher = QuoteRefresher::new(
        service,
        Arc::new(LoggingSink),
        clock,
        config.refresh.symbols.clone(),
    )
    .with_symbol_delay(config.refresh.symbol_delay)
    .spawn();

    // Questions typed on stdin go to the chat backend when one is configured
    let chat_task = chat_client_from_env()?.map(|client| tokio::spawn(run_chat_prompt(client)));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    if let Some(task) = chat_task {
        task.abort();
    }
    refresher.stop();
    refresher.join().await;
    Ok(())
}
