//! Ledger repository and service traits.
//!
//! These traits define the contract for ledger operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::ledger_model::{
    Holding, NewTrade, TradeCommit, TradeOutcome, Transaction, TransactionFilter,
    TransactionUpdate,
};
use crate::errors::Result;

/// Trait defining the contract for ledger persistence.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    fn get_holding(&self, user_id: &str, symbol: &str) -> Result<Option<Holding>>;

    /// Holdings of a user ordered by symbol.
    fn list_holdings(&self, user_id: &str) -> Result<Vec<Holding>>;

    /// Inserts the transaction and applies the holding change as one unit.
    ///
    /// Must fail with `Error::ConcurrencyConflict`, writing nothing, when the
    /// stored holding version does not match `commit.expected_version`.
    async fn commit_trade(&self, commit: TradeCommit) -> Result<TradeOutcome>;

    /// Fails with `DatabaseError::NotFound` for unknown ids.
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;

    /// Transactions of a user, newest first.
    fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>>;

    /// Overwrites the editable columns of an existing transaction.
    async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction>;

    /// Returns the number of deleted records.
    async fn delete_transaction(&self, transaction_id: &str) -> Result<usize>;
}

/// Trait defining the contract for ledger service operations.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Records a trade and updates the holding atomically.
    async fn apply_trade(&self, trade: NewTrade) -> Result<TradeOutcome>;

    fn get_holdings(&self, user_id: &str) -> Result<Vec<Holding>>;

    fn get_holding(&self, user_id: &str, symbol: &str) -> Result<Option<Holding>>;

    fn get_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>>;

    fn get_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Transaction>;

    /// Corrects a transaction row. The holding is left as is.
    async fn update_transaction(
        &self,
        user_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction>;

    /// Removes a transaction row. The holding is left as is.
    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<()>;
}
