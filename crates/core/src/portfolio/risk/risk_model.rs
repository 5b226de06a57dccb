use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorExposure {
    pub sector: String,
    /// Cost-basis value held in the sector
    pub value: Decimal,
    pub percentage: Decimal,
    pub holding_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionWeight {
    pub symbol: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

/// Heuristic risk profile computed from cost basis.
///
/// Beta, volatility, drawdown and VaR are rule-of-thumb estimates driven by
/// configurable constants, not statistical models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub user_id: String,
    pub total_value: Decimal,
    pub holding_count: usize,
    pub sector_exposure: Vec<SectorExposure>,
    pub herfindahl_index: Decimal,
    pub concentration_level: RiskLevel,
    pub diversification_score: Decimal,
    pub portfolio_beta: Decimal,
    pub expected_volatility: Decimal,
    pub expected_return: Decimal,
    pub sharpe_ratio: Decimal,
    /// Percent
    pub max_drawdown_estimate: Decimal,
    /// One-day 95% value at risk, in currency
    pub value_at_risk_95: Decimal,
    pub largest_position: Option<PositionWeight>,
    pub recommendations: Vec<String>,
    pub as_of: DateTime<Utc>,
}
