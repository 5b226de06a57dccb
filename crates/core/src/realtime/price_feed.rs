//! Background poller that turns quote changes into `price_update` events.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::event::HubEvent;
use super::hub::HubHandle;
use crate::errors::{ErrorKind, Result};
use crate::quotes::QuoteClient;

#[derive(Default)]
struct FeedState {
    last_prices: HashMap<String, Decimal>,
    /// Symbols the provider rejected for good; no longer polled.
    unavailable: HashSet<String>,
}

pub struct PriceFeed {
    hub: HubHandle,
    quote_client: QuoteClient,
    watchlist: Vec<String>,
    state: Mutex<FeedState>,
}

impl PriceFeed {
    pub fn new(hub: HubHandle, quote_client: QuoteClient, watchlist: Vec<String>) -> Self {
        Self {
            hub,
            quote_client,
            watchlist: watchlist.iter().map(|s| s.trim().to_uppercase()).collect(),
            state: Mutex::new(FeedState::default()),
        }
    }

    /// Polls the watch list plus every subscribed symbol once and publishes the
    /// prices that moved since the last poll. Returns the number of updates.
    ///
    /// Transient quote failures are retried on the next poll. Symbols the
    /// provider rejects outright are dropped from polling.
    pub async fn poll_once(&self) -> Result<usize> {
        let mut symbols: BTreeSet<String> = self.watchlist.iter().cloned().collect();
        symbols.extend(self.hub.subscribed_symbols().await?);

        let mut state = self.state.lock().await;
        symbols.retain(|symbol| !state.unavailable.contains(symbol));
        if symbols.is_empty() {
            return Ok(0);
        }

        let symbols: Vec<String> = symbols.into_iter().collect();
        let prices = self.quote_client.fetch_quotes(&symbols).await;
        for (symbol, err) in prices.failures() {
            if err.is_transient() {
                debug!("Price feed skipped {} this tick: {}", symbol, err);
            } else {
                warn!("Price feed dropping {}: {}", symbol, err);
                state.unavailable.insert(symbol.clone());
            }
        }

        let mut published = 0;
        for symbol in &symbols {
            let Some(quote) = prices.quote(symbol) else {
                continue;
            };
            if state.last_prices.get(symbol) == Some(&quote.price) {
                continue;
            }
            state.last_prices.insert(symbol.clone(), quote.price);
            self.hub.publish(HubEvent::price_update(quote.clone())).await?;
            published += 1;
        }
        Ok(published)
    }

    /// Polls every `interval` until the hub shuts down.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.poll_once().await {
                    Ok(0) => {}
                    Ok(n) => debug!("Price feed published {} update(s)", n),
                    Err(e) if e.kind() == ErrorKind::Internal => {
                        info!("Price feed stopping: {}", e);
                        break;
                    }
                    Err(e) => warn!("Price feed poll failed: {}", e),
                }
            }
        })
    }
}
