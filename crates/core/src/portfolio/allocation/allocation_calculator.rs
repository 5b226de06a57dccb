//! Groups holdings by catalog attributes using cost-basis value.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;

use super::allocation_model::{AllocationBreakdown, AllocationSlice, TopHolding};
use crate::assets::Asset;
use crate::constants::{DEFAULT_ASSET_TYPE, UNKNOWN_SECTOR};
use crate::ledger::Holding;
use crate::utils::decimal_utils::percentage_of;

/// Catalog attribute a breakdown groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKey {
    AssetType,
    Sector,
}

impl AllocationKey {
    fn category_of<'a>(self, asset: Option<&'a Asset>) -> &'a str {
        match (self, asset) {
            (AllocationKey::AssetType, Some(a)) => &a.asset_type,
            (AllocationKey::Sector, Some(a)) => &a.sector,
            (AllocationKey::AssetType, None) => DEFAULT_ASSET_TYPE,
            (AllocationKey::Sector, None) => UNKNOWN_SECTOR,
        }
    }
}

/// Cost-basis value per category, largest first; ties ordered by category name.
pub fn allocation_by(
    holdings: &[Holding],
    assets: &HashMap<String, Asset>,
    key: AllocationKey,
) -> Vec<AllocationSlice> {
    let mut grouped: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for holding in holdings {
        let entry = grouped
            .entry(key.category_of(assets.get(&holding.symbol)))
            .or_default();
        entry.0 += holding.cost_basis();
        entry.1 += 1;
    }

    let total: Decimal = grouped.values().map(|(v, _)| *v).sum();
    let mut slices: Vec<AllocationSlice> = grouped
        .into_iter()
        .map(|(category, (value, holding_count))| AllocationSlice {
            category: category.to_string(),
            value,
            percentage: percentage_of(value, total),
            holding_count,
        })
        .collect();
    slices.sort_by(|a, b| b.value.cmp(&a.value));
    slices
}

/// The `limit` largest positions by cost basis.
pub fn top_holdings(
    holdings: &[Holding],
    assets: &HashMap<String, Asset>,
    limit: usize,
) -> Vec<TopHolding> {
    let total: Decimal = holdings.iter().map(Holding::cost_basis).sum();
    let mut ranked: Vec<&Holding> = holdings.iter().collect();
    ranked.sort_by(|a, b| {
        b.cost_basis()
            .cmp(&a.cost_basis())
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|h| TopHolding {
            symbol: h.symbol.clone(),
            name: assets
                .get(&h.symbol)
                .map(|a| a.name.clone())
                .unwrap_or_else(|| h.symbol.clone()),
            value: h.cost_basis(),
            percentage: percentage_of(h.cost_basis(), total),
        })
        .collect()
}

pub fn breakdown(
    user_id: &str,
    holdings: &[Holding],
    assets: &HashMap<String, Asset>,
    top_n: usize,
) -> AllocationBreakdown {
    AllocationBreakdown {
        user_id: user_id.to_string(),
        total_value: holdings.iter().map(Holding::cost_basis).sum(),
        by_asset_type: allocation_by(holdings, assets, AllocationKey::AssetType),
        by_sector: allocation_by(holdings, assets, AllocationKey::Sector),
        top_holdings: top_holdings(holdings, assets, top_n),
        as_of: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(symbol: &str, quantity: Decimal, average_cost: Decimal) -> Holding {
        Holding {
            id: format!("h-{}", symbol),
            user_id: "u1".to_string(),
            symbol: symbol.to_string(),
            quantity,
            average_cost,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn asset(symbol: &str, asset_type: &str, sector: &str) -> (String, Asset) {
        let mut asset = Asset::unlisted(symbol);
        asset.name = format!("{} Inc.", symbol);
        asset.asset_type = asset_type.to_string();
        asset.sector = sector.to_string();
        (symbol.to_string(), asset)
    }

    #[test]
    fn test_breakdown_by_type_and_sector() {
        let holdings = vec![
            holding("AAPL", dec!(10), dec!(150)),
            holding("SPY", dec!(2), dec!(500)),
            holding("XOM", dec!(5), dec!(100)),
        ];
        let assets: HashMap<_, _> = [
            asset("AAPL", "Stock", "Technology"),
            asset("SPY", "ETF", "Diversified"),
            asset("XOM", "Stock", "Energy"),
        ]
        .into_iter()
        .collect();

        let view = breakdown("u1", &holdings, &assets, 10);

        assert_eq!(view.total_value, dec!(3000));
        assert_eq!(view.by_asset_type[0].category, "Stock");
        assert_eq!(view.by_asset_type[0].value, dec!(2000));
        assert_eq!(view.by_asset_type[0].percentage, dec!(66.67));
        assert_eq!(view.by_asset_type[0].holding_count, 2);
        assert_eq!(view.by_asset_type[1].percentage, dec!(33.33));

        let sectors: Vec<&str> = view.by_sector.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(sectors, vec!["Technology", "Diversified", "Energy"]);

        assert_eq!(view.top_holdings[0].symbol, "AAPL");
        assert_eq!(view.top_holdings[0].name, "AAPL Inc.");
        assert_eq!(view.top_holdings[0].percentage, dec!(50));
    }

    #[test]
    fn test_top_holdings_respects_limit_and_ties() {
        let holdings = vec![
            holding("B", dec!(1), dec!(100)),
            holding("A", dec!(1), dec!(100)),
            holding("C", dec!(1), dec!(50)),
        ];
        let top = top_holdings(&holdings, &HashMap::new(), 2);
        let symbols: Vec<&str> = top.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "B"]);
    }

    #[test]
    fn test_uncataloged_symbols_use_defaults() {
        let holdings = vec![holding("ZZZ", dec!(1), dec!(10))];
        let by_type = allocation_by(&holdings, &HashMap::new(), AllocationKey::AssetType);
        let by_sector = allocation_by(&holdings, &HashMap::new(), AllocationKey::Sector);
        assert_eq!(by_type[0].category, "Stock");
        assert_eq!(by_sector[0].category, "Unknown");
    }

    #[test]
    fn test_empty_portfolio() {
        let view = breakdown("u1", &[], &HashMap::new(), 10);
        assert_eq!(view.total_value, Decimal::ZERO);
        assert!(view.by_asset_type.is_empty());
        assert!(view.top_holdings.is_empty());
    }
}
