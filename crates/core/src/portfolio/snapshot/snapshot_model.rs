use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time portfolio valuation, appended on every performance query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: String,
    pub user_id: String,
    pub taken_at: DateTime<Utc>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub unrealized_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPortfolioSnapshot {
    pub user_id: String,
    pub taken_at: DateTime<Utc>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub unrealized_pnl: Decimal,
}
