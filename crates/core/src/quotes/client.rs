//! Quote Client - timeout-bounded facade for the market-data crate.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, warn};

use ledgerfolio_market_data::{CompanyProfile, MarketDataError, Quote, QuoteProvider};

use super::price_book::PriceBook;

/// Wraps a provider so that no call outlives the configured timeout.
///
/// On timeout the in-flight provider future is dropped and a
/// `MarketDataError::Timeout` is returned. The client never retries.
#[derive(Clone)]
pub struct QuoteClient {
    provider: Arc<dyn QuoteProvider>,
    timeout: Duration,
}

impl QuoteClient {
    pub fn new(provider: Arc<dyn QuoteProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.bounded("quote", symbol, self.provider.get_quote(symbol))
            .await
    }

    pub async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        self.bounded("profile", symbol, self.provider.get_profile(symbol))
            .await
    }

    /// Fetches quotes for all `symbols` concurrently.
    ///
    /// Duplicates are fetched once. Every symbol ends up either priced or in
    /// the failure list of the returned book.
    pub async fn fetch_quotes(&self, symbols: &[String]) -> PriceBook {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = symbols.iter().filter(|s| seen.insert(*s)).collect();

        if unique.is_empty() {
            return PriceBook::default();
        }

        let results = join_all(unique.iter().map(|symbol| self.get_quote(symbol))).await;

        let mut book = PriceBook::default();
        for (symbol, result) in unique.into_iter().zip(results) {
            match result {
                Ok(quote) => book.insert_quote(symbol.clone(), quote),
                Err(err) => book.insert_failure(symbol.clone(), err),
            }
        }
        debug!(
            "Fetched {} quotes from {} ({} failed)",
            book.len(),
            self.provider.id(),
            book.failures().len()
        );
        book
    }

    async fn bounded<T, F>(
        &self,
        operation: &str,
        symbol: &str,
        call: F,
    ) -> Result<T, MarketDataError>
    where
        F: Future<Output = Result<T, MarketDataError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} {} lookup for {} exceeded {:?}",
                    self.provider.id(),
                    operation,
                    symbol,
                    self.timeout
                );
                Err(MarketDataError::Timeout {
                    provider: self.provider.id().to_string(),
                })
            }
        }
    }
}
