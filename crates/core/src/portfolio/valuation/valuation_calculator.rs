//! Prices holdings against a [`PriceBook`].

use std::collections::HashMap;

use log::warn;
use rust_decimal::Decimal;

use super::valuation_model::{HoldingValuation, PortfolioValuation};
use crate::assets::Asset;
use crate::ledger::Holding;
use crate::quotes::price_book::{fallback_warning, PriceBook};
use crate::utils::decimal_utils::percentage_of;

/// Values each holding at its live price, falling back to average cost.
///
/// Holdings keep their input order. Every fallback adds one warning.
pub fn value_holdings(
    holdings: &[Holding],
    assets: &HashMap<String, Asset>,
    prices: &PriceBook,
) -> PortfolioValuation {
    let mut valuation = PortfolioValuation::default();

    for holding in holdings {
        let (current_price, price_is_fallback) =
            prices.price_or(&holding.symbol, holding.average_cost);
        if price_is_fallback {
            warn!("No live price for {}, using average cost", holding.symbol);
            valuation.warnings.push(fallback_warning(&holding.symbol));
        }

        let cost_basis = holding.cost_basis();
        let market_value = holding.quantity * current_price;
        let unrealized_pnl = market_value - cost_basis;

        let (day_change, day_change_percent) = match prices.quote(&holding.symbol) {
            Some(quote) => (quote.change * holding.quantity, quote.change_percent),
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        let asset = assets.get(&holding.symbol);
        valuation.total_value += market_value;
        valuation.total_cost += cost_basis;
        valuation.day_change += day_change;
        valuation.holdings.push(HoldingValuation {
            symbol: holding.symbol.clone(),
            name: asset.map(|a| a.name.clone()).unwrap_or_else(|| holding.symbol.clone()),
            asset_type: asset
                .map(|a| a.asset_type.clone())
                .unwrap_or_else(|| Asset::unlisted(&holding.symbol).asset_type),
            sector: asset
                .map(|a| a.sector.clone())
                .unwrap_or_else(|| Asset::unlisted(&holding.symbol).sector),
            quantity: holding.quantity,
            average_cost: holding.average_cost,
            current_price,
            cost_basis,
            market_value,
            unrealized_pnl,
            unrealized_pnl_percent: percentage_of(unrealized_pnl, cost_basis),
            day_change,
            day_change_percent,
            weight: Decimal::ZERO,
            price_is_fallback,
        });
    }

    valuation.unrealized_pnl = valuation.total_value - valuation.total_cost;
    let total_value = valuation.total_value;
    for h in valuation.holdings.iter_mut() {
        h.weight = percentage_of(h.market_value, total_value);
    }
    valuation
}

/// Day change relative to the value at the previous close.
pub fn day_change_percent(total_value: Decimal, day_change: Decimal) -> Decimal {
    percentage_of(day_change, total_value - day_change)
}
