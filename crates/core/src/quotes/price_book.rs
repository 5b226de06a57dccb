use std::collections::HashMap;

use rust_decimal::Decimal;

use ledgerfolio_market_data::{MarketDataError, Quote};

/// Quotes gathered for one read, plus the symbols that could not be priced.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    quotes: HashMap<String, Quote>,
    failures: Vec<(String, MarketDataError)>,
}

impl PriceBook {
    pub fn insert_quote(&mut self, symbol: String, quote: Quote) {
        self.quotes.insert(symbol, quote);
    }

    pub fn insert_failure(&mut self, symbol: String, error: MarketDataError) {
        self.failures.push((symbol, error));
    }

    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.quotes.get(symbol).map(|q| q.price)
    }

    /// Live price, or `fallback` when the symbol could not be priced.
    pub fn price_or(&self, symbol: &str, fallback: Decimal) -> (Decimal, bool) {
        match self.price(symbol) {
            Some(price) => (price, false),
            None => (fallback, true),
        }
    }

    pub fn failures(&self) -> &[(String, MarketDataError)] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty() && self.failures.is_empty()
    }
}

/// Warning attached to a view when a holding is valued at cost.
pub fn fallback_warning(symbol: &str) -> String {
    format!(
        "Live price unavailable for {}; valued at average cost",
        symbol
    )
}
