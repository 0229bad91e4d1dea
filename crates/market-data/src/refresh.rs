//! Periodic quote refresh and the update port consumers subscribe through.
//!
//! A refresh cycle publishes the market status, then fetches each tracked
//! symbol in turn with a pause between symbols, then sleeps for the market
//! clock's interval (short while the market is open, long otherwise).
//!
//! Stopping is cooperative: the loop notices the stop signal at the next
//! pause, sleep, or cycle boundary. A quote request already in flight is
//! allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::market_clock::MarketClock;
use crate::models::Quote;
use crate::service::MarketDataService;

/// Default pause between two symbols within a cycle.
pub const DEFAULT_SYMBOL_DELAY: Duration = Duration::from_secs(1);

/// A message published by the refresh loop.
#[derive(Clone, Debug, PartialEq)]
pub enum QuoteUpdate {
    /// A complete quote, real or synthetic.
    Quote(Quote),
    /// Market session state at the start of a cycle.
    MarketStatus { open: bool },
}

/// Receiver side of the update port.
pub trait QuoteSink: Send + Sync {
    fn publish(&self, update: QuoteUpdate);
}

/// Forwards updates into a tokio channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<QuoteUpdate>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<QuoteUpdate>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<QuoteUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl QuoteSink for ChannelSink {
    fn publish(&self, update: QuoteUpdate) {
        if self.tx.send(update).is_err() {
            debug!("Quote update dropped: receiver closed");
        }
    }
}

/// Periodic refresher for a fixed symbol set.
pub struct QuoteRefresher {
    service: Arc<MarketDataService>,
    sink: Arc<dyn QuoteSink>,
    clock: MarketClock,
    symbols: Vec<String>,
    symbol_delay: Duration,
}

impl QuoteRefresher {
    pub fn new(
        service: Arc<MarketDataService>,
        sink: Arc<dyn QuoteSink>,
        clock: MarketClock,
        symbols: Vec<String>,
    ) -> Self {
        Self {
            service,
            sink,
            clock,
            symbols,
            symbol_delay: DEFAULT_SYMBOL_DELAY,
        }
    }

    pub fn with_symbol_delay(mut self, delay: Duration) -> Self {
        self.symbol_delay = delay;
        self
    }

    /// Build a refresher with the default symbol delay and spawn it.
    pub fn start(
        service: Arc<MarketDataService>,
        sink: Arc<dyn QuoteSink>,
        clock: MarketClock,
        symbols: Vec<String>,
    ) -> RefreshHandle {
        Self::new(service, sink, clock, symbols).spawn()
    }

    /// Spawn the refresh loop on the current tokio runtime.
    pub fn spawn(self) -> RefreshHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        RefreshHandle { stop_tx, task }
    }

    async fn run(self, mut stop_rx: watch::Receiver<bool>) {
        info!(
            "Quote refresher started for {} symbols",
            self.symbols.len()
        );

        let mut cycles: u64 = 0;
        loop {
            if *stop_rx.borrow() {
                break;
            }

            cycles += 1;
            if !self.run_cycle(&mut stop_rx).await {
                break;
            }

            let wait = self.clock.refresh_interval(Utc::now());
            debug!("Refresh cycle {} done, next in {:?}", cycles, wait);
            if !Self::pause(wait, &mut stop_rx).await {
                break;
            }
        }

        info!("Quote refresher stopped after {} cycles", cycles);
    }

    /// One cycle. Returns false if a stop was requested part way through.
    async fn run_cycle(&self, stop_rx: &mut watch::Receiver<bool>) -> bool {
        let open = self.clock.is_open(Utc::now());
        self.sink.publish(QuoteUpdate::MarketStatus { open });

        for (i, symbol) in self.symbols.iter().enumerate() {
            if i > 0 && !Self::pause(self.symbol_delay, stop_rx).await {
                return false;
            }
            let quote = self.service.get_real_time_quote(symbol).await;
            self.sink.publish(QuoteUpdate::Quote(quote));
        }

        true
    }

    /// Sleep for `duration` unless stopped first. Returns false on stop.
    async fn pause(duration: Duration, stop_rx: &mut watch::Receiver<bool>) -> bool {
        if *stop_rx.borrow() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    warn!("Refresh handle dropped without stop, shutting down");
                }
                false
            }
        }
    }
}

/// Control handle for a running refresher.
///
/// Dropping the handle also stops the loop.
pub struct RefreshHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Ask the loop to stop. Idempotent.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to exit. Without a prior [`RefreshHandle::stop`]
    /// this waits indefinitely.
    pub async fn join(self) {
        let RefreshHandle { stop_tx, task } = self;
        if let Err(e) = task.await {
            warn!("Quote refresher task ended abnormally: {}", e);
        }
        drop(stop_tx);
    }
}
