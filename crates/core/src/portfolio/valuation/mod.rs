//! Valuation of holdings against live quotes.

mod valuation_calculator;
mod valuation_model;

pub use valuation_calculator::{day_change_percent, value_holdings};
pub use valuation_model::{HoldingValuation, PortfolioSummary, PortfolioValuation};
