//! Allocation models for portfolio breakdown by category.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Share of the portfolio held in one category (asset type or sector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub category: String,
    /// Total cost-basis value in the category
    pub value: Decimal,
    /// Percentage of total portfolio (0-100)
    pub percentage: Decimal,
    pub holding_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopHolding {
    pub symbol: String,
    pub name: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

/// Complete allocation view. Slices are sorted by value descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBreakdown {
    pub user_id: String,
    pub total_value: Decimal,
    pub by_asset_type: Vec<AllocationSlice>,
    pub by_sector: Vec<AllocationSlice>,
    pub top_holdings: Vec<TopHolding>,
    pub as_of: DateTime<Utc>,
}
