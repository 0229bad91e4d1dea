use livetrader_chat::{ChatBackend, ChatClient, ANONYMOUS_USER};
use livetrader_market_data::{QuoteSink, QuoteUpdate};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing() {
    let log_format = std::env::var("LIVETRADER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Prints every refresh update as a log line.
pub struct LoggingSink;

impl QuoteSink for LoggingSink {
    fn publish(&self, update: QuoteUpdate) {
        match update {
            QuoteUpdate::MarketStatus { open } => {
                tracing::info!(market_open = open, "Market is {}", if open { "open" } else { "closed" });
            }
            QuoteUpdate::Quote(quote) => {
                tracing::info!(
                    symbol = %quote.symbol,
                    source = %quote.source,
                    synthetic = quote.is_synthetic(),
                    "{} {} ({:+} / {:+}%)",
                    quote.symbol,
                    quote.price.round_dp(2),
                    quote.change.round_dp(2),
                    quote.change_percent.round_dp(2),
                );
            }
        }
    }
}

/// Chat client for `LIVETRADER_CHAT_URL`, if set.
pub fn chat_client_from_env() -> anyhow::Result<Option<ChatClient>> {
    match std::env::var("LIVETRADER_CHAT_URL") {
        Ok(url) if !url.trim().is_empty() => {
            let client = ChatClient::new(&url)?;
            tracing::info!("Chat backend: {}", client.endpoint());
            Ok(Some(client))
        }
        _ => {
            tracing::debug!("LIVETRADER_CHAT_URL not set, chat disabled");
            Ok(None)
        }
    }
}

/// Read questions line by line from stdin and log the answers.
pub async fn run_chat_prompt(client: ChatClient) {
    let user_id = std::env::var("LIVETRADER_USER_ID").unwrap_or_else(|_| ANONYMOUS_USER.to_string());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match client.send(&line, &user_id).await {
            Ok(reply) => tracing::info!(target: "chat", "{}", reply.response),
            Err(e) => tracing::warn!(target: "chat", "{}", e.user_message()),
        }
    }
}
