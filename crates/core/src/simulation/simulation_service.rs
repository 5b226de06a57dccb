use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::simulation_model::{
    AllocationShift, DiversificationImpact, PositionView, WhatIfAction, WhatIfRequest, WhatIfResult,
};
use super::simulation_traits::SimulationServiceTrait;
use crate::assets::{Asset, AssetServiceTrait};
use crate::config::EngineConfig;
use crate::errors::{Error, LedgerError, Result, SimulationError};
use crate::ledger::{cost_basis, Holding, LedgerRepositoryTrait};
use crate::portfolio::valuation::{value_holdings, PortfolioValuation};
use crate::quotes::QuoteClient;
use crate::users::UserRepositoryTrait;
use crate::utils::decimal_utils::percentage_of;

const LOW_RISK_ADJUSTED_RETURN: Decimal = dec!(0.3);
const HIGH_RISK_ADJUSTED_RETURN: Decimal = dec!(0.5);

pub struct SimulationService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    asset_service: Arc<dyn AssetServiceTrait>,
    quote_client: QuoteClient,
    config: Arc<EngineConfig>,
}

impl SimulationService {
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        asset_service: Arc<dyn AssetServiceTrait>,
        quote_client: QuoteClient,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            ledger_repository,
            user_repository,
            asset_service,
            quote_client,
            config,
        }
    }

    /// Live valuation of the current holdings plus the catalog entry of `symbol`.
    async fn current_state(
        &self,
        user_id: &str,
        symbol: &str,
    ) -> Result<(Vec<Holding>, PortfolioValuation, Asset)> {
        let holdings = self.ledger_repository.list_holdings(user_id)?;

        let mut symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();
        if !symbols.iter().any(|s| s == symbol) {
            symbols.push(symbol.to_string());
        }
        let mut assets: HashMap<String, Asset> = self
            .asset_service
            .get_assets_or_unlisted(&symbols)?
            .into_iter()
            .map(|a| (a.symbol.clone(), a))
            .collect();
        let target = assets
            .remove(symbol)
            .unwrap_or_else(|| Asset::unlisted(symbol));
        assets.insert(symbol.to_string(), target.clone());

        let held: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();
        let prices = self.quote_client.fetch_quotes(&held).await;
        let valuation = value_holdings(&holdings, &assets, &prices);
        Ok((holdings, valuation, target))
    }
}

fn invalid(message: String) -> Error {
    SimulationError::InvalidSimulation(message).into()
}

/// Market value per asset type before and after moving `signed_trade_value` into `asset_type`.
fn allocation_shift(
    valuation: &PortfolioValuation,
    asset_type: &str,
    signed_trade_value: Decimal,
) -> Vec<AllocationShift> {
    let mut before: BTreeMap<String, Decimal> = BTreeMap::new();
    for h in &valuation.holdings {
        *before.entry(h.asset_type.clone()).or_default() += h.market_value;
    }

    let mut after = before.clone();
    let slot = after.entry(asset_type.to_string()).or_default();
    *slot = (*slot + signed_trade_value).max(Decimal::ZERO);

    let before_total: Decimal = before.values().copied().sum();
    let after_total: Decimal = after.values().copied().sum();

    after
        .iter()
        .map(|(category, after_value)| {
            let before_percent = percentage_of(
                before.get(category).copied().unwrap_or_default(),
                before_total,
            );
            let after_percent = percentage_of(*after_value, after_total);
            AllocationShift {
                asset_type: category.clone(),
                before_percent,
                after_percent,
                delta: after_percent - before_percent,
            }
        })
        .collect()
}

fn recommendations(
    request: &WhatIfRequest,
    impact: DiversificationImpact,
    projected: Option<&PositionView>,
    risk_adjusted_return: Decimal,
) -> Vec<String> {
    let mut notes = vec![format!(
        "{} of {}: {}",
        match request.action {
            WhatIfAction::Buy => "Buying",
            WhatIfAction::Sell => "Selling",
        },
        request.symbol,
        impact.label().to_lowercase()
    )];

    match impact {
        DiversificationImpact::SignificantIncrease => notes.push(format!(
            "This trade would make {} a large share of the portfolio; consider a smaller position",
            request.symbol
        )),
        DiversificationImpact::SignificantReduction => notes.push(format!(
            "This sale frees a large share of the portfolio; \
             plan where to redeploy the proceeds from {}",
            request.symbol
        )),
        _ => {}
    }

    if request.action == WhatIfAction::Sell && projected.is_none() {
        notes.push(format!("The sale closes the {} position", request.symbol));
    }

    if request.action == WhatIfAction::Buy {
        if risk_adjusted_return < LOW_RISK_ADJUSTED_RETURN {
            notes.push(format!(
                "{} offers a low expected return for its volatility",
                request.symbol
            ));
        } else if risk_adjusted_return >= HIGH_RISK_ADJUSTED_RETURN {
            notes.push(format!(
                "{} has a favorable expected return for its volatility",
                request.symbol
            ));
        }
    }
    notes
}

#[async_trait]
impl SimulationServiceTrait for SimulationService {
    async fn simulate(&self, user_id: &str, request: WhatIfRequest) -> Result<WhatIfResult> {
        let request = request.normalized();
        request.validate()?;
        let trade_value = request.trade_value()?;
        if self.user_repository.get_by_id(user_id)?.is_none() {
            return Err(Error::UserNotFound(user_id.to_string()));
        }

        let (holdings, valuation, target) = self.current_state(user_id, &request.symbol).await?;
        let current = holdings
            .iter()
            .find(|h| h.symbol == request.symbol)
            .map(Holding::position);

        let projected = cost_basis::project(
            &request.symbol,
            current,
            request.action.into(),
            request.quantity,
            request.price,
        )
        .map_err(|e| match e {
            LedgerError::InsufficientPosition {
                symbol,
                requested,
                available,
            } if available.is_zero() => invalid(format!(
                "no {} position to sell (requested {})",
                symbol, requested
            )),
            LedgerError::InsufficientPosition {
                symbol,
                requested,
                available,
            } => invalid(format!(
                "cannot sell {} {}: only {} held",
                requested, symbol, available
            )),
            LedgerError::ArithmeticOverflow { symbol } => {
                invalid(format!("position in {} would overflow", symbol))
            }
        })?;

        let signed_trade_value = match request.action {
            WhatIfAction::Buy => trade_value,
            WhatIfAction::Sell => -trade_value,
        };
        let value_before = valuation.total_value;
        let value_after = value_before
            .checked_add(signed_trade_value)
            .ok_or_else(|| {
                invalid(format!(
                    "portfolio value after {} would overflow",
                    request.symbol
                ))
            })?;

        let concentration_change_percent = percentage_of(trade_value, value_after);
        let diversification_impact =
            DiversificationImpact::classify(request.action, concentration_change_percent);

        let outlook = self.config.symbols.outlook(&request.symbol);
        let expected_return_amount = signed_trade_value
            .checked_mul(outlook.expected_return)
            .ok_or_else(|| {
                invalid(format!(
                    "expected return on {} would overflow",
                    request.symbol
                ))
            })?
            .round_dp(2);
        let risk_adjusted_return = if outlook.volatility.is_zero() {
            Decimal::ZERO
        } else {
            (outlook.expected_return / outlook.volatility).round_dp(4)
        };

        let current_position = current.map(PositionView::from);
        let projected_position = projected.map(PositionView::from);
        let recommendations = recommendations(
            &request,
            diversification_impact,
            projected_position.as_ref(),
            risk_adjusted_return,
        );

        debug!(
            "Simulated {:?} {} {} for {}: value {} -> {}",
            request.action, request.quantity, request.symbol, user_id, value_before, value_after
        );

        Ok(WhatIfResult {
            user_id: user_id.to_string(),
            trade_value,
            current_position,
            projected_position,
            value_before,
            value_after,
            allocation_shift: allocation_shift(&valuation, &target.asset_type, signed_trade_value),
            concentration_change_percent,
            diversification_impact,
            expected_annual_return: outlook.expected_return,
            expected_return_amount,
            expected_volatility: outlook.volatility,
            risk_adjusted_return,
            recommendations,
            warnings: valuation.warnings,
            request,
        })
    }
}
