//! Database models for holdings and transactions.

use diesel::prelude::*;

use ledgerfolio_core::ledger::{Holding, TradeType, Transaction};

use crate::errors::StorageError;
use crate::utils::{decimal_to_text, parse_decimal, parse_timestamp, timestamp_to_text};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::holdings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HoldingDB {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub quantity: String,
    pub average_cost: String,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<HoldingDB> for Holding {
    type Error = StorageError;

    fn try_from(db: HoldingDB) -> Result<Self, Self::Error> {
        Ok(Self {
            quantity: parse_decimal(&db.quantity, "holdings.quantity")?,
            average_cost: parse_decimal(&db.average_cost, "holdings.average_cost")?,
            created_at: parse_timestamp(&db.created_at, "holdings.created_at")?,
            updated_at: parse_timestamp(&db.updated_at, "holdings.updated_at")?,
            id: db.id,
            user_id: db.user_id,
            symbol: db.symbol,
            version: db.version,
        })
    }
}

impl From<&Holding> for HoldingDB {
    fn from(holding: &Holding) -> Self {
        Self {
            id: holding.id.clone(),
            user_id: holding.user_id.clone(),
            symbol: holding.symbol.clone(),
            quantity: decimal_to_text(holding.quantity),
            average_cost: decimal_to_text(holding.average_cost),
            version: holding.version,
            created_at: timestamp_to_text(holding.created_at),
            updated_at: timestamp_to_text(holding.updated_at),
        }
    }
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub symbol: String,
    pub trade_type: String,
    pub quantity: String,
    pub price: String,
    pub fees: String,
    pub total_amount: String,
    pub notes: Option<String>,
    pub executed_at: String,
    pub created_at: String,
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = StorageError;

    fn try_from(db: TransactionDB) -> Result<Self, Self::Error> {
        let trade_type = db
            .trade_type
            .parse::<TradeType>()
            .map_err(|e| StorageError::Corrupt(format!("transactions.trade_type: {}", e)))?;
        Ok(Self {
            trade_type,
            quantity: parse_decimal(&db.quantity, "transactions.quantity")?,
            price: parse_decimal(&db.price, "transactions.price")?,
            fees: parse_decimal(&db.fees, "transactions.fees")?,
            total_amount: parse_decimal(&db.total_amount, "transactions.total_amount")?,
            executed_at: parse_timestamp(&db.executed_at, "transactions.executed_at")?,
            created_at: parse_timestamp(&db.created_at, "transactions.created_at")?,
            id: db.id,
            user_id: db.user_id,
            symbol: db.symbol,
            notes: db.notes,
        })
    }
}

impl From<&Transaction> for TransactionDB {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            user_id: tx.user_id.clone(),
            symbol: tx.symbol.clone(),
            trade_type: tx.trade_type.as_str().to_string(),
            quantity: decimal_to_text(tx.quantity),
            price: decimal_to_text(tx.price),
            fees: decimal_to_text(tx.fees),
            total_amount: decimal_to_text(tx.total_amount),
            notes: tx.notes.clone(),
            executed_at: timestamp_to_text(tx.executed_at),
            created_at: timestamp_to_text(tx.created_at),
        }
    }
}
