//! Ledgerfolio Market Data Crate
//!
//! Provider-agnostic quote and company profile access for the Ledgerfolio
//! engine. The crate defines the [`QuoteProvider`] seam that concrete market
//! data APIs implement, the models they return, and [`StaticQuoteProvider`],
//! an in-memory implementation for offline use and tests.
//!
//! # Core Types
//!
//! - [`Quote`] - Latest price with day change and OHLC reference values
//! - [`CompanyProfile`] - Provider-sourced name, sector and asset type
//! - [`MarketDataError`] - Failure taxonomy for provider calls

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::{CompanyProfile, Quote};
pub use provider::{QuoteProvider, StaticQuoteProvider};
