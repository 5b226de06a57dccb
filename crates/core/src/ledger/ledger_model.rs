//! Ledger domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cost_basis::Position;
use crate::errors::{Error, LedgerError, Result, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "BUY",
            TradeType::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(TradeType::Buy),
            "SELL" => Ok(TradeType::Sell),
            other => {
                let message = format!("unknown trade type '{}'", other);
                Err(ValidationError::InvalidInput(message).into())
            }
        }
    }
}

/// Current position of a user in one symbol.
///
/// A holding with zero quantity never exists; selling the last unit deletes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    /// Incremented on every write; used for conditional commits.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.average_cost
    }

    pub fn position(&self) -> Position {
        Position {
            quantity: self.quantity,
            average_cost: self.average_cost,
        }
    }
}

/// Immutable record of one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub trade_type: TradeType,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fees: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub executed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Cash value of a trade: fees are added to buys and deducted from sells.
pub fn total_amount(
    symbol: &str,
    trade_type: TradeType,
    quantity: Decimal,
    price: Decimal,
    fees: Decimal,
) -> std::result::Result<Decimal, LedgerError> {
    let total = quantity.checked_mul(price).and_then(|gross| match trade_type {
        TradeType::Buy => gross.checked_add(fees),
        TradeType::Sell => gross.checked_sub(fees),
    });
    total.ok_or_else(|| LedgerError::ArithmeticOverflow {
        symbol: symbol.to_string(),
    })
}

fn validate_amounts(quantity: Decimal, price: Decimal, fees: Decimal) -> Result<()> {
    if quantity <= Decimal::ZERO {
        return Err(
            ValidationError::InvalidInput("quantity must be greater than zero".to_string()).into(),
        );
    }
    if price <= Decimal::ZERO {
        return Err(
            ValidationError::InvalidInput("price must be greater than zero".to_string()).into(),
        );
    }
    if fees < Decimal::ZERO {
        return Err(ValidationError::InvalidInput("fees must not be negative".to_string()).into());
    }
    Ok(())
}

/// A trade request before it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrade {
    pub user_id: String,
    pub symbol: String,
    pub trade_type: TradeType,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub fees: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to the commit time.
    #[serde(default)]
    pub executed_at: Option<DateTime<Utc>>,
}

impl NewTrade {
    pub fn new(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        trade_type: TradeType,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            symbol: symbol.into(),
            trade_type,
            quantity,
            price,
            fees: Decimal::ZERO,
            notes: None,
            executed_at: None,
        }
    }

    pub fn buy(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(user_id, symbol, TradeType::Buy, quantity, price)
    }

    pub fn sell(
        user_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self::new(user_id, symbol, TradeType::Sell, quantity, price)
    }

    pub fn with_fees(mut self, fees: Decimal) -> Self {
        self.fees = fees;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trims and upper-cases the symbol.
    pub fn normalized(mut self) -> Self {
        self.symbol = self.symbol.trim().to_uppercase();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId".to_string()).into());
        }
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        validate_amounts(self.quantity, self.price, self.fees)
    }

    pub fn total_amount(&self) -> Result<Decimal> {
        Ok(total_amount(
            &self.symbol,
            self.trade_type,
            self.quantity,
            self.price,
            self.fees,
        )?)
    }
}

/// Corrective edit of a recorded transaction.
///
/// Applying it rewrites the transaction row only; the holding keeps the
/// values derived when the trade was first recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub id: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fees: Decimal,
    pub notes: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl TransactionUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()).into());
        }
        validate_amounts(self.quantity, self.price, self.fees)
    }

    /// Applies the edit on top of the stored row.
    pub fn apply_to(self, existing: Transaction) -> Result<Transaction> {
        let total_amount = total_amount(
            &existing.symbol,
            existing.trade_type,
            self.quantity,
            self.price,
            self.fees,
        )?;
        Ok(Transaction {
            total_amount,
            quantity: self.quantity,
            price: self.price,
            fees: self.fees,
            notes: self.notes,
            executed_at: self.executed_at,
            ..existing
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub symbol: Option<String>,
    pub trade_type: Option<TradeType>,
    pub limit: Option<usize>,
}

/// What happens to the holding row when a trade commits.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldingChange {
    Upsert(Holding),
    Delete { holding_id: String },
}

/// One atomic ledger write: the transaction insert plus the holding change.
///
/// `expected_version` is the holding version observed when the change was
/// computed, or `None` when no holding existed. Stores must reject the commit
/// with `ConcurrencyConflict` if the stored state differs.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCommit {
    pub user_id: String,
    pub symbol: String,
    pub expected_version: Option<i64>,
    pub transaction: Transaction,
    pub holding_change: HoldingChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOutcome {
    pub transaction: Transaction,
    /// None when the trade closed the position.
    pub holding: Option<Holding>,
}
