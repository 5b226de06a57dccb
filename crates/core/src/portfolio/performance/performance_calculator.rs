use rust_decimal::Decimal;

use super::performance_model::HoldingReturn;
use crate::portfolio::snapshot::PortfolioSnapshot;
use crate::portfolio::valuation::PortfolioValuation;
use crate::utils::decimal_utils::percentage_of;

pub fn holding_returns(valuation: &PortfolioValuation) -> Vec<HoldingReturn> {
    valuation
        .holdings
        .iter()
        .map(|h| HoldingReturn {
            symbol: h.symbol.clone(),
            name: h.name.clone(),
            market_value: h.market_value,
            cost_basis: h.cost_basis,
            return_amount: h.unrealized_pnl,
            return_percent: h.unrealized_pnl_percent,
            day_change: h.day_change,
            day_change_percent: h.day_change_percent,
            price_is_fallback: h.price_is_fallback,
        })
        .collect()
}

/// Highest and lowest return percentage. The first holding wins ties.
pub fn best_and_worst(returns: &[HoldingReturn]) -> (Option<HoldingReturn>, Option<HoldingReturn>) {
    let mut best: Option<&HoldingReturn> = None;
    let mut worst: Option<&HoldingReturn> = None;
    for r in returns {
        if best.map_or(true, |b| r.return_percent > b.return_percent) {
            best = Some(r);
        }
        if worst.map_or(true, |w| r.return_percent < w.return_percent) {
            worst = Some(r);
        }
    }
    (best.cloned(), worst.cloned())
}

/// Change of `current_value` against the oldest snapshot of the window.
pub fn period_change(history: &[PortfolioSnapshot], current_value: Decimal) -> (Decimal, Decimal) {
    match history.first() {
        Some(oldest) => {
            let change = current_value - oldest.total_value;
            (change, percentage_of(change, oldest.total_value))
        }
        None => (Decimal::ZERO, Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn ret(symbol: &str, pct: Decimal) -> HoldingReturn {
        HoldingReturn {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            market_value: dec!(100),
            cost_basis: dec!(100),
            return_amount: dec!(0),
            return_percent: pct,
            day_change: dec!(0),
            day_change_percent: dec!(0),
            price_is_fallback: false,
        }
    }

    fn snapshot(total_value: Decimal) -> PortfolioSnapshot {
        PortfolioSnapshot {
            id: "s".to_string(),
            user_id: "u1".to_string(),
            taken_at: Utc::now(),
            total_value,
            total_cost: total_value,
            unrealized_pnl: dec!(0),
        }
    }

    #[test]
    fn test_best_and_worst() {
        let returns = vec![
            ret("A", dec!(5)),
            ret("B", dec!(-3)),
            ret("C", dec!(12)),
            ret("D", dec!(12)),
        ];
        let (best, worst) = best_and_worst(&returns);
        assert_eq!(best.unwrap().symbol, "C");
        assert_eq!(worst.unwrap().symbol, "B");
    }

    #[test]
    fn test_best_and_worst_empty() {
        let (best, worst) = best_and_worst(&[]);
        assert!(best.is_none() && worst.is_none());
    }

    #[test]
    fn test_period_change_against_oldest() {
        let history = vec![snapshot(dec!(1000)), snapshot(dec!(1050))];
        assert_eq!(period_change(&history, dec!(1100)), (dec!(100), dec!(10)));
        assert_eq!(period_change(&[], dec!(1100)), (dec!(0), dec!(0)));
    }
}
