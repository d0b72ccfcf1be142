//! Live ticker poller and statistics panel loader

use crate::notifier::Notifier;
use async_trait::async_trait;
use mirror_core::{MarketCoin, Notice, Result, TickerQuote, TickerSnapshot};
use mirror_networking::api::statistics;
use mirror_networking::MarketDataClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default ticker refresh period
pub const DEFAULT_TICKER_INTERVAL: Duration = Duration::from_secs(5);

/// Where ticker rows come from
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<TickerQuote>>;
}

/// Ticker rows fetched over HTTP
pub struct HttpTickerSource {
    client: Arc<MarketDataClient>,
    url: String,
}

impl HttpTickerSource {
    pub fn new(client: Arc<MarketDataClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TickerSource for HttpTickerSource {
    async fn fetch(&self) -> Result<Vec<TickerQuote>> {
        self.client.fetch_ticker(&self.url).await
    }
}

/// Handle to a running ticker poller
pub struct TickerHandle {
    rx: watch::Receiver<TickerSnapshot>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Latest snapshot
    pub fn latest(&self) -> TickerSnapshot {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TickerSnapshot> {
        self.rx.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the poller and wait for it to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Ticker task ended abnormally: {}", e);
        }
    }
}

/// Spawn the ticker loop. The first poll happens immediately.
pub fn spawn_ticker_poller(
    source: Arc<dyn TickerSource>,
    interval: Duration,
    notifier: Arc<dyn Notifier>,
) -> TickerHandle {
    let (tx, rx) = watch::channel(TickerSnapshot::default());
    let cancel = CancellationToken::new();

    let task = tokio::spawn(ticker_loop(source, interval, notifier, tx, cancel.clone()));

    TickerHandle { rx, cancel, task }
}

async fn ticker_loop(
    source: Arc<dyn TickerSource>,
    period: Duration,
    notifier: Arc<dyn Notifier>,
    tx: watch::Sender<TickerSnapshot>,
    cancel: CancellationToken,
) {
    info!("Ticker poller started ({:?})", period);

    let mut interval = tokio::time::interval(period.max(Duration::from_millis(10)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut healthy = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Ticker poller cancelled, exiting");
                return;
            }
            _ = interval.tick() => {
                poll_once(source.as_ref(), &tx, notifier.as_ref(), &mut healthy).await;
            }
        }
    }
}

/// One poll. Failures keep the previous quotes and mark the snapshot stale;
/// only the first failure of an outage is reported.
async fn poll_once(
    source: &dyn TickerSource,
    tx: &watch::Sender<TickerSnapshot>,
    notifier: &dyn Notifier,
    healthy: &mut bool,
) {
    match source.fetch().await {
        Ok(quotes) => {
            if !*healthy {
                info!("Ticker feed recovered");
            }
            debug!("Ticker: {} quotes", quotes.len());
            *healthy = true;
            tx.send_replace(TickerSnapshot {
                quotes,
                fetched_at: Some(chrono::Utc::now()),
                stale: false,
            });
        }
        Err(e) => {
            tx.send_modify(|snapshot| snapshot.stale = true);
            if *healthy {
                warn!("Ticker poll failed: {}", e);
                notifier.notify(Notice::failure("Failed to fetch live ticker", &e));
                *healthy = false;
            } else {
                debug!("Ticker still unavailable: {}", e);
            }
        }
    }
}

/// Load the statistics panel; a failure is reported once and returned
pub async fn load_statistics(
    client: &MarketDataClient,
    limit: u32,
    notifier: &dyn Notifier,
) -> Result<Vec<MarketCoin>> {
    match statistics::top_coins(client, limit).await {
        Ok(coins) => Ok(coins),
        Err(e) => {
            warn!("Failed to load statistics: {}", e);
            notifier.notify(Notice::failure("Failed to load market statistics", &e));
            Err(e)
        }
    }
}
