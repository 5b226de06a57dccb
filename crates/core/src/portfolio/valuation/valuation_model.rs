use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One holding priced against the latest quote (or its cost, as fallback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    pub symbol: String,
    pub name: String,
    pub asset_type: String,
    pub sector: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub current_price: Decimal,
    pub cost_basis: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_percent: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
    /// Share of the portfolio market value, in percent
    pub weight: Decimal,
    /// True when no live price was available and `current_price` is the average cost
    pub price_is_fallback: bool,
}

/// Totals over a set of valued holdings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioValuation {
    pub holdings: Vec<HoldingValuation>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub unrealized_pnl: Decimal,
    pub day_change: Decimal,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub user_id: String,
    pub holdings: Vec<HoldingValuation>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub unrealized_pnl: Decimal,
    pub unrealized_pnl_percent: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
    pub holding_count: usize,
    pub warnings: Vec<String>,
    pub as_of: DateTime<Utc>,
}
