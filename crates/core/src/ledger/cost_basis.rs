//! Average-cost position arithmetic.
//!
//! Shared by the ledger (which persists the result) and the what-if
//! simulator (which only reports it). Buys re-average the cost; sells reduce
//! quantity and never touch the average.

use rust_decimal::Decimal;

use super::ledger_model::TradeType;
use crate::errors::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub quantity: Decimal,
    pub average_cost: Decimal,
}

impl Position {
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.average_cost
    }
}

fn overflow(symbol: &str) -> LedgerError {
    LedgerError::ArithmeticOverflow {
        symbol: symbol.to_string(),
    }
}

/// Quantity-weighted average of the existing position and the new lot.
pub fn apply_buy(
    symbol: &str,
    current: Option<Position>,
    quantity: Decimal,
    price: Decimal,
) -> Result<Position, LedgerError> {
    let Some(current) = current else {
        // The opening lot's cost basis must still be representable.
        quantity.checked_mul(price).ok_or_else(|| overflow(symbol))?;
        return Ok(Position {
            quantity,
            average_cost: price,
        });
    };

    let new_quantity = current
        .quantity
        .checked_add(quantity)
        .ok_or_else(|| overflow(symbol))?;
    let total_cost = current
        .quantity
        .checked_mul(current.average_cost)
        .and_then(|held| quantity.checked_mul(price).and_then(|lot| held.checked_add(lot)))
        .ok_or_else(|| overflow(symbol))?;
    let average_cost = total_cost
        .checked_div(new_quantity)
        .ok_or_else(|| overflow(symbol))?;

    Ok(Position {
        quantity: new_quantity,
        average_cost,
    })
}

/// Reduces the position. Returns `None` when it is fully closed.
pub fn apply_sell(
    symbol: &str,
    current: Option<Position>,
    quantity: Decimal,
) -> Result<Option<Position>, LedgerError> {
    let available = current.map(|p| p.quantity).unwrap_or(Decimal::ZERO);
    if quantity > available {
        return Err(LedgerError::InsufficientPosition {
            symbol: symbol.to_string(),
            requested: quantity,
            available,
        });
    }

    match current {
        Some(position) if quantity < position.quantity => Ok(Some(Position {
            quantity: position.quantity - quantity,
            average_cost: position.average_cost,
        })),
        _ => Ok(None),
    }
}

/// Position after applying one trade to `current`.
pub fn project(
    symbol: &str,
    current: Option<Position>,
    trade_type: TradeType,
    quantity: Decimal,
    price: Decimal,
) -> Result<Option<Position>, LedgerError> {
    match trade_type {
        TradeType::Buy => apply_buy(symbol, current, quantity, price).map(Some),
        TradeType::Sell => apply_sell(symbol, current, quantity),
    }
}
