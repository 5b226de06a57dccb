//! Property-based tests for the cost-basis ledger and the portfolio aggregates.
//!
//! Random trade sequences are replayed through the position arithmetic and
//! the resulting holdings are fed to the allocation and risk calculators.

use std::collections::HashMap;

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use ledgerfolio_core::assets::Asset;
use ledgerfolio_core::errors::LedgerError;
use ledgerfolio_core::ledger::cost_basis::{self, Position};
use ledgerfolio_core::ledger::{Holding, TradeType};
use ledgerfolio_core::portfolio::allocation::{allocation_by, AllocationKey};
use ledgerfolio_core::portfolio::risk::{herfindahl_index, sector_exposure};

// =============================================================================
// Generators
// =============================================================================

/// Whole quantities between 1 and 100.
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=100).prop_map(Decimal::from)
}

/// Prices with two decimals between 0.01 and 5000.00.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (1i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_trade() -> impl Strategy<Value = (TradeType, Decimal, Decimal)> {
    (
        prop_oneof![Just(TradeType::Buy), Just(TradeType::Sell)],
        arb_quantity(),
        arb_price(),
    )
}

fn arb_sector() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Technology".to_string()),
        Just("Healthcare".to_string()),
        Just("Energy".to_string()),
        Just("Financials".to_string()),
    ]
}

/// Distinct symbols, each with a positive position and a sector.
fn arb_portfolio(max: usize) -> impl Strategy<Value = Vec<(Holding, Asset)>> {
    let position = (arb_quantity(), arb_price(), arb_sector());
    proptest::collection::btree_map("[A-Z]{1,5}", position, 1..=max)
        .prop_map(|positions| {
            positions
                .into_iter()
                .map(|(symbol, (quantity, average_cost, sector))| {
                    let now = Utc::now();
                    let holding = Holding {
                        id: format!("h-{}", symbol),
                        user_id: "u1".to_string(),
                        symbol: symbol.clone(),
                        quantity,
                        average_cost,
                        version: 1,
                        created_at: now,
                        updated_at: now,
                    };
                    let asset = Asset {
                        symbol: symbol.clone(),
                        name: symbol,
                        asset_type: "stock".to_string(),
                        sector,
                        created_at: now,
                    };
                    (holding, asset)
                })
                .collect()
        })
}

fn split(portfolio: Vec<(Holding, Asset)>) -> (Vec<Holding>, HashMap<String, Asset>) {
    let mut holdings = Vec::new();
    let mut assets = HashMap::new();
    for (holding, asset) in portfolio {
        assets.insert(asset.symbol.clone(), asset);
        holdings.push(holding);
    }
    (holdings, assets)
}

/// Applies every lot as a buy, starting from no position.
fn replay_buys<'a>(
    lots: impl Iterator<Item = &'a (Decimal, Decimal)>,
) -> Result<Option<Position>, LedgerError> {
    let mut position = None;
    for (quantity, price) in lots {
        position = Some(cost_basis::apply_buy("AAPL", position, *quantity, *price)?);
    }
    Ok(position)
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Quantity equals accepted buys minus accepted sells and never goes negative.
    /// Rejected sells leave the position untouched.
    #[test]
    fn prop_quantity_tracks_accepted_trades(
        trades in proptest::collection::vec(arb_trade(), 1..40),
    ) {
        let mut position: Option<Position> = None;
        let mut expected = Decimal::ZERO;

        for (trade_type, quantity, price) in trades {
            match cost_basis::project("AAPL", position, trade_type, quantity, price) {
                Ok(next) => {
                    match trade_type {
                        TradeType::Buy => expected += quantity,
                        TradeType::Sell => expected -= quantity,
                    }
                    position = next;
                }
                Err(LedgerError::InsufficientPosition { requested, available, .. }) => {
                    prop_assert_eq!(trade_type, TradeType::Sell);
                    prop_assert!(requested > available);
                    prop_assert_eq!(available, expected);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }

            let held = position.map(|p| p.quantity).unwrap_or(Decimal::ZERO);
            prop_assert_eq!(held, expected);
            prop_assert!(held >= Decimal::ZERO);
            // A closed position is represented as absent, never as zero.
            prop_assert!(position.map_or(true, |p| p.quantity > Decimal::ZERO));
        }
    }

    /// The average cost of an open position lies between the cheapest and the
    /// dearest buy since the position was last closed.
    #[test]
    fn prop_average_cost_is_bounded_by_buy_prices(
        trades in proptest::collection::vec(arb_trade(), 1..40),
    ) {
        let mut position: Option<Position> = None;
        let mut bounds: Option<(Decimal, Decimal)> = None;

        for (trade_type, quantity, price) in trades {
            let Ok(next) = cost_basis::project("AAPL", position, trade_type, quantity, price) else {
                continue;
            };
            if trade_type == TradeType::Buy {
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(price), hi.max(price)),
                    None => (price, price),
                });
            }
            position = next;
            if position.is_none() {
                bounds = None;
            }

            if let (Some(p), Some((lo, hi))) = (position, bounds) {
                // Allow for the last digit of the 28-digit division.
                let slack = Decimal::new(1, 20);
                prop_assert!(p.average_cost >= lo - slack, "{} < {}", p.average_cost, lo);
                prop_assert!(p.average_cost <= hi + slack, "{} > {}", p.average_cost, hi);
            }
        }
    }

    /// After a run of buys the average cost is the quantity-weighted mean of the
    /// lots, whatever order they arrive in.
    #[test]
    fn prop_buy_average_is_weighted_mean_in_any_order(
        lots in proptest::collection::vec((arb_quantity(), arb_price()), 1..30),
    ) {
        let forward = replay_buys(lots.iter()).unwrap().unwrap();
        let reverse = replay_buys(lots.iter().rev()).unwrap().unwrap();

        let total_quantity: Decimal = lots.iter().map(|(q, _)| *q).sum();
        let total_cost: Decimal = lots.iter().map(|(q, p)| q * p).sum();
        let mean = total_cost / total_quantity;

        // Allow for the last digit of the 28-digit division.
        let slack = Decimal::new(1, 20);
        prop_assert_eq!(forward.quantity, total_quantity);
        prop_assert_eq!(reverse.quantity, total_quantity);
        prop_assert!(
            (forward.average_cost - mean).abs() <= slack,
            "{} vs {}",
            forward.average_cost,
            mean
        );
        prop_assert!(
            (reverse.average_cost - mean).abs() <= slack,
            "{} vs {}",
            reverse.average_cost,
            mean
        );
    }

    /// Selling never changes the average cost of what remains.
    #[test]
    fn prop_sell_keeps_average_cost(
        held in arb_quantity(),
        average_cost in arb_price(),
        sold in arb_quantity(),
    ) {
        let current = Position { quantity: held, average_cost };
        match cost_basis::apply_sell("MSFT", Some(current), sold) {
            Ok(Some(rest)) => {
                prop_assert_eq!(rest.average_cost, average_cost);
                prop_assert_eq!(rest.quantity, held - sold);
            }
            Ok(None) => prop_assert_eq!(sold, held),
            Err(_) => prop_assert!(sold > held),
        }
    }

    /// Allocation slices cover every holding once and their percentages sum
    /// to 100 within rounding.
    #[test]
    fn prop_allocation_percentages_sum_to_hundred(portfolio in arb_portfolio(12)) {
        let (holdings, assets) = split(portfolio);
        let slices = allocation_by(&holdings, &assets, AllocationKey::Sector);

        let count: usize = slices.iter().map(|s| s.holding_count).sum();
        prop_assert_eq!(count, holdings.len());

        let total: Decimal = slices.iter().map(|s| s.percentage).sum();
        let tolerance = Decimal::new(5, 3) * Decimal::from(slices.len());
        prop_assert!((total - Decimal::ONE_HUNDRED).abs() <= tolerance, "sum was {}", total);

        for pair in slices.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
        }
    }

    /// The Herfindahl index is at least 1/n for n sectors and at most 1.
    #[test]
    fn prop_herfindahl_index_is_bounded(portfolio in arb_portfolio(12)) {
        let (holdings, assets) = split(portfolio);
        let exposure = sector_exposure(&holdings, &assets);
        let hhi = herfindahl_index(&exposure);

        let floor = (Decimal::ONE / Decimal::from(exposure.len())).round_dp(4);
        prop_assert!(hhi >= floor - Decimal::new(1, 4), "{} below {}", hhi, floor);
        prop_assert!(hhi <= Decimal::ONE);
        if exposure.len() == 1 {
            prop_assert_eq!(hhi, Decimal::ONE);
        }
    }
}
