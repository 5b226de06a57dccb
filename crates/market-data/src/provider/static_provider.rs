//! In-memory quote provider.
//!
//! Serves quotes and profiles from a local table. Used for offline runs,
//! fixtures loaded from JSON, and tests that need to steer provider behavior
//! (failures, latency).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::traits::QuoteProvider;
use crate::errors::MarketDataError;
use crate::models::{CompanyProfile, Quote};

const PROVIDER_ID: &str = "STATIC";

#[derive(Default)]
struct Tables {
    quotes: HashMap<String, Quote>,
    profiles: HashMap<String, CompanyProfile>,
    failing: HashSet<String>,
    latency: Option<Duration>,
}

/// Fixture file layout accepted by [`StaticQuoteProvider::from_json`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Fixture {
    quotes: Vec<Quote>,
    profiles: Vec<CompanyProfile>,
}

/// Quote provider backed by an in-memory table.
#[derive(Default)]
pub struct StaticQuoteProvider {
    tables: RwLock<Tables>,
    quote_calls: AtomicUsize,
}

impl StaticQuoteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads quotes and profiles from a JSON fixture.
    pub fn from_json(json: &str) -> Result<Self, MarketDataError> {
        let fixture: Fixture =
            serde_json::from_str(json).map_err(|e| MarketDataError::ValidationFailed {
                message: format!("invalid quote fixture: {}", e),
            })?;

        let provider = Self::new();
        for quote in fixture.quotes {
            provider.set_quote(quote);
        }
        for profile in fixture.profiles {
            provider.set_profile(profile);
        }
        Ok(provider)
    }

    /// Sets the price for a symbol, keeping any existing reference close.
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        let key = symbol.to_uppercase();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let previous_close = tables
            .quotes
            .get(&key)
            .map(|q| q.previous_close)
            .unwrap_or(price);
        tables
            .quotes
            .insert(key.clone(), Quote::from_price(key, price, previous_close, Utc::now()));
    }

    pub fn set_quote(&self, quote: Quote) {
        let key = quote.symbol.to_uppercase();
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .quotes
            .insert(key, quote);
    }

    pub fn set_profile(&self, profile: CompanyProfile) {
        let key = profile.symbol.to_uppercase();
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .profiles
            .insert(key, profile);
    }

    /// Makes every call for `symbol` fail with a provider error.
    pub fn fail_symbol(&self, symbol: &str) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .failing
            .insert(symbol.to_uppercase());
    }

    pub fn recover_symbol(&self, symbol: &str) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .failing
            .remove(&symbol.to_uppercase());
    }

    /// Delays every response by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .latency = latency;
    }

    /// Number of `get_quote` calls served so far.
    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    fn latency(&self) -> Option<Duration> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latency
    }

    fn check_failing(&self, symbol: &str) -> Result<(), MarketDataError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        if tables.failing.contains(symbol) {
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("configured failure for {}", symbol),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for StaticQuoteProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency() {
            tokio::time::sleep(latency).await;
        }

        let key = symbol.to_uppercase();
        self.check_failing(&key)?;

        let quote = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .quotes
            .get(&key)
            .cloned();

        debug!("Static quote lookup for {}: found={}", key, quote.is_some());
        quote.ok_or(MarketDataError::SymbolNotFound(key))
    }

    async fn get_profile(&self, symbol: &str) -> Result<CompanyProfile, MarketDataError> {
        if let Some(latency) = self.latency() {
            tokio::time::sleep(latency).await;
        }

        let key = symbol.to_uppercase();
        self.check_failing(&key)?;

        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .profiles
            .get(&key)
            .cloned()
            .ok_or(MarketDataError::SymbolNotFound(key))
    }
}
