//! Live quote access for the engine.
//!
//! - [`client`] - Timeout-bounded facade over a
//!   [`QuoteProvider`](ledgerfolio_market_data::QuoteProvider)
//! - [`price_book`] - Result of a concurrent multi-symbol fetch, with failures
//!   kept alongside prices
//!
//! Provider failures never abort a read. Callers consult the [`PriceBook`] and
//! fall back to cost basis for symbols without a price.

pub mod client;
pub mod price_book;

pub use client::QuoteClient;
pub use price_book::PriceBook;

pub use ledgerfolio_market_data::{CompanyProfile, Quote};
