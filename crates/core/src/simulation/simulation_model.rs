//! What-if request and result models.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::errors::SimulationError;
use crate::ledger::{Position, TradeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhatIfAction {
    Buy,
    Sell,
}

impl From<WhatIfAction> for TradeType {
    fn from(action: WhatIfAction) -> Self {
        match action {
            WhatIfAction::Buy => TradeType::Buy,
            WhatIfAction::Sell => TradeType::Sell,
        }
    }
}

/// A hypothetical trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfRequest {
    pub action: WhatIfAction,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

impl WhatIfRequest {
    pub fn buy(symbol: impl Into<String>, quantity: Decimal, price: Decimal) -> Self {
        Self {
            action: WhatIfAction::Buy,
            symbol: symbol.into(),
            quantity,
            price,
        }
    }

    pub fn sell(symbol: impl Into<String>, quantity: Decimal, price: Decimal) -> Self {
        Self {
            action: WhatIfAction::Sell,
            symbol: symbol.into(),
            quantity,
            price,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.symbol = self.symbol.trim().to_uppercase();
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.symbol.is_empty() {
            return Err(SimulationError::InvalidSimulation("symbol is required".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(SimulationError::InvalidSimulation(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(SimulationError::InvalidSimulation(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        Ok(())
    }

    pub fn trade_value(&self) -> Result<Decimal, SimulationError> {
        self.quantity.checked_mul(self.price).ok_or_else(|| {
            SimulationError::InvalidSimulation(format!(
                "trade value for {} would overflow",
                self.symbol
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub cost_basis: Decimal,
}

impl From<Position> for PositionView {
    fn from(position: Position) -> Self {
        Self {
            quantity: position.quantity,
            average_cost: position.average_cost,
            cost_basis: position.cost_basis(),
        }
    }
}

/// Weight of one asset type before and after the trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationShift {
    pub asset_type: String,
    pub before_percent: Decimal,
    pub after_percent: Decimal,
    pub delta: Decimal,
}

const SIGNIFICANT_CHANGE: Decimal = dec!(25);
const MODERATE_CHANGE: Decimal = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversificationImpact {
    SignificantIncrease,
    ModerateIncrease,
    MinimalIncrease,
    SignificantReduction,
    ModerateReduction,
    MinimalReduction,
}

impl DiversificationImpact {
    /// Classifies how much the trade moves concentration, by direction.
    pub fn classify(action: WhatIfAction, concentration_change_percent: Decimal) -> Self {
        let significant = concentration_change_percent > SIGNIFICANT_CHANGE;
        let moderate = concentration_change_percent > MODERATE_CHANGE;
        match action {
            WhatIfAction::Buy if significant => Self::SignificantIncrease,
            WhatIfAction::Buy if moderate => Self::ModerateIncrease,
            WhatIfAction::Buy => Self::MinimalIncrease,
            WhatIfAction::Sell if significant => Self::SignificantReduction,
            WhatIfAction::Sell if moderate => Self::ModerateReduction,
            WhatIfAction::Sell => Self::MinimalReduction,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SignificantIncrease => "Significant concentration increase",
            Self::ModerateIncrease => "Moderate concentration increase",
            Self::MinimalIncrease => "Minimal concentration increase",
            Self::SignificantReduction => "Significant concentration reduction",
            Self::ModerateReduction => "Moderate concentration reduction",
            Self::MinimalReduction => "Minimal concentration reduction",
        }
    }
}

/// Projected effect of a hypothetical trade.
///
/// Carries no timestamps: the same request against the same ledger and quotes
/// yields an identical result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfResult {
    pub user_id: String,
    pub request: WhatIfRequest,
    pub trade_value: Decimal,
    pub current_position: Option<PositionView>,
    /// `None` when a sell closes the position
    pub projected_position: Option<PositionView>,
    pub value_before: Decimal,
    pub value_after: Decimal,
    pub allocation_shift: Vec<AllocationShift>,
    pub concentration_change_percent: Decimal,
    pub diversification_impact: DiversificationImpact,
    /// Annual rate from the symbol outlook table
    pub expected_annual_return: Decimal,
    /// `trade_value * expected_annual_return`, negative for sells
    pub expected_return_amount: Decimal,
    pub expected_volatility: Decimal,
    pub risk_adjusted_return: Decimal,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds() {
        use DiversificationImpact::*;
        assert_eq!(
            DiversificationImpact::classify(WhatIfAction::Buy, dec!(25.01)),
            SignificantIncrease
        );
        assert_eq!(DiversificationImpact::classify(WhatIfAction::Buy, dec!(25)), ModerateIncrease);
        assert_eq!(DiversificationImpact::classify(WhatIfAction::Buy, dec!(10)), MinimalIncrease);
        assert_eq!(
            DiversificationImpact::classify(WhatIfAction::Sell, dec!(30)),
            SignificantReduction
        );
        assert_eq!(
            DiversificationImpact::classify(WhatIfAction::Sell, dec!(10.5)),
            ModerateReduction
        );
        assert_eq!(DiversificationImpact::classify(WhatIfAction::Sell, dec!(0)), MinimalReduction);
    }

    #[test]
    fn test_request_validation() {
        assert!(WhatIfRequest::buy("AAPL", dec!(1), dec!(10)).validate().is_ok());
        assert!(WhatIfRequest::buy("AAPL", dec!(0), dec!(10)).validate().is_err());
        assert!(WhatIfRequest::sell("AAPL", dec!(1), dec!(-1)).validate().is_err());
        assert!(WhatIfRequest::buy("  ", dec!(1), dec!(1)).normalized().validate().is_err());
    }

    #[test]
    fn test_action_serializes_lowercase() {
        let json = serde_json::to_string(&WhatIfRequest::sell("MSFT", dec!(2), dec!(300))).unwrap();
        assert!(json.contains("\"action\":\"sell\""));
    }
}
