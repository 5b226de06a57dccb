use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::{debug, warn};

use ledgerfolio_core::errors::{DatabaseError, Error, Result};
use ledgerfolio_core::ledger::{
    Holding, HoldingChange, LedgerRepositoryTrait, TradeCommit, TradeOutcome, Transaction,
    TransactionFilter,
};

use super::model::{HoldingDB, TransactionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{holdings, transactions};

pub struct LedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn current_version(
    conn: &mut SqliteConnection,
    user_id: &str,
    symbol: &str,
) -> Result<Option<i64>> {
    Ok(holdings::table
        .filter(holdings::user_id.eq(user_id))
        .filter(holdings::symbol.eq(symbol))
        .select(holdings::version)
        .first::<i64>(conn)
        .optional()
        .map_err(StorageError::from)?)
}

/// Applies one trade inside the writer's transaction. Any error rolls back the
/// transaction insert together with the holding change.
fn commit_in(conn: &mut SqliteConnection, commit: TradeCommit) -> Result<TradeOutcome> {
    let stored = current_version(conn, &commit.user_id, &commit.symbol)?;
    if stored != commit.expected_version {
        debug!(
            "Holding {}/{} is at version {:?}, commit expected {:?}",
            commit.user_id, commit.symbol, stored, commit.expected_version
        );
        return Err(Error::ConcurrencyConflict {
            user_id: commit.user_id,
            symbol: commit.symbol,
        });
    }

    diesel::insert_into(transactions::table)
        .values(TransactionDB::from(&commit.transaction))
        .execute(conn)
        .map_err(StorageError::from)?;

    let holding = match commit.holding_change {
        HoldingChange::Upsert(holding) => {
            let row = HoldingDB::from(&holding);
            match commit.expected_version {
                None => {
                    diesel::insert_into(holdings::table)
                        .values(&row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Some(expected) => {
                    let updated = diesel::update(
                        holdings::table
                            .filter(holdings::id.eq(&row.id))
                            .filter(holdings::version.eq(expected)),
                    )
                    .set((
                        holdings::quantity.eq(&row.quantity),
                        holdings::average_cost.eq(&row.average_cost),
                        holdings::version.eq(row.version),
                        holdings::updated_at.eq(&row.updated_at),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                    if updated != 1 {
                        return Err(Error::ConcurrencyConflict {
                            user_id: commit.user_id,
                            symbol: commit.symbol,
                        });
                    }
                }
            }
            Some(holding)
        }
        HoldingChange::Delete { holding_id } => {
            diesel::delete(holdings::table.find(&holding_id))
                .execute(conn)
                .map_err(StorageError::from)?;
            None
        }
    };

    Ok(TradeOutcome {
        transaction: commit.transaction,
        holding,
    })
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn get_holding(&self, user_id: &str, symbol: &str) -> Result<Option<Holding>> {
        let mut conn = get_connection(&self.pool)?;
        let row = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .filter(holdings::symbol.eq(symbol))
            .select(HoldingDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Holding::try_from).transpose()?)
    }

    fn list_holdings(&self, user_id: &str) -> Result<Vec<Holding>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = holdings::table
            .filter(holdings::user_id.eq(user_id))
            .order(holdings::symbol.asc())
            .select(HoldingDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Holding::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn commit_trade(&self, commit: TradeCommit) -> Result<TradeOutcome> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| commit_in(conn, commit))
            .await
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions::table
            .find(transaction_id)
            .select(TransactionDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("transaction {}", transaction_id)))
            })?;
        Ok(Transaction::try_from(row)?)
    }

    fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = transactions::table
            .select(TransactionDB::as_select())
            .into_boxed()
            .filter(transactions::user_id.eq(user_id));
        if let Some(symbol) = &filter.symbol {
            query = query.filter(transactions::symbol.eq(symbol.clone()));
        }
        if let Some(trade_type) = filter.trade_type {
            query = query.filter(transactions::trade_type.eq(trade_type.as_str()));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = query
            .order((transactions::executed_at.desc(), transactions::created_at.desc()))
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Transaction::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        let row = TransactionDB::from(&transaction);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let updated = diesel::update(transactions::table.find(&row.id))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    warn!("Transaction {} vanished before its correction was written", row.id);
                    return Err(Error::Database(DatabaseError::NotFound(format!(
                        "transaction {}",
                        row.id
                    ))));
                }
                Ok(transaction)
            })
            .await
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<usize> {
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(transactions::table.find(transaction_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}
