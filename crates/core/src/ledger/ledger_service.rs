use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::cost_basis;
use super::ledger_model::{
    Holding, HoldingChange, NewTrade, TradeCommit, TradeOutcome, TradeType, Transaction,
    TransactionFilter, TransactionUpdate,
};
use super::ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
use super::trade_locks::TradeLocks;
use crate::assets::AssetServiceTrait;
use crate::constants::MAX_CONFLICT_RETRIES;
use crate::errors::{DatabaseError, Error, ErrorKind, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::users::UserRepositoryTrait;

/// The single writer that keeps holdings aligned with transactions.
pub struct LedgerService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    asset_service: Arc<dyn AssetServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    trade_locks: TradeLocks,
}

impl LedgerService {
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        asset_service: Arc<dyn AssetServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            ledger_repository,
            user_repository,
            asset_service,
            event_sink,
            trade_locks: TradeLocks::new(),
        }
    }

    fn ensure_user(&self, user_id: &str) -> Result<()> {
        match self.user_repository.get_by_id(user_id)? {
            Some(_) => Ok(()),
            None => {
                error!("Ledger call for unknown user {}", user_id);
                Err(Error::UserNotFound(user_id.to_string()))
            }
        }
    }

    /// Reads the current holding and computes the commit for `trade`.
    fn prepare_commit(&self, trade: &NewTrade, total_amount: Decimal) -> Result<TradeCommit> {
        let existing = self
            .ledger_repository
            .get_holding(&trade.user_id, &trade.symbol)?;

        let projected = cost_basis::project(
            &trade.symbol,
            existing.as_ref().map(Holding::position),
            trade.trade_type,
            trade.quantity,
            trade.price,
        )?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: trade.user_id.clone(),
            symbol: trade.symbol.clone(),
            trade_type: trade.trade_type,
            quantity: trade.quantity,
            price: trade.price,
            fees: trade.fees,
            total_amount,
            notes: trade.notes.clone(),
            executed_at: trade.executed_at.unwrap_or(now),
            created_at: now,
        };

        let expected_version = existing.as_ref().map(|h| h.version);
        let holding_change = match (existing, projected) {
            (Some(holding), Some(position)) => HoldingChange::Upsert(Holding {
                quantity: position.quantity,
                average_cost: position.average_cost,
                version: holding.version + 1,
                updated_at: now,
                ..holding
            }),
            (None, Some(position)) => HoldingChange::Upsert(Holding {
                id: Uuid::new_v4().to_string(),
                user_id: trade.user_id.clone(),
                symbol: trade.symbol.clone(),
                quantity: position.quantity,
                average_cost: position.average_cost,
                version: 1,
                created_at: now,
                updated_at: now,
            }),
            (Some(holding), None) => HoldingChange::Delete {
                holding_id: holding.id,
            },
            (None, None) => {
                return Err(Error::Unexpected(format!(
                    "trade on {} produced no position from an empty holding",
                    trade.symbol
                )))
            }
        };

        Ok(TradeCommit {
            user_id: trade.user_id.clone(),
            symbol: trade.symbol.clone(),
            expected_version,
            transaction,
            holding_change,
        })
    }

    /// Fetches a transaction and hides it from other users.
    fn owned_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Transaction> {
        let transaction = match self.ledger_repository.get_transaction(transaction_id) {
            Ok(tx) => tx,
            Err(Error::Database(DatabaseError::NotFound(_))) => {
                return Err(Error::TransactionNotFound(transaction_id.to_string()))
            }
            Err(e) => return Err(e),
        };

        if transaction.user_id != user_id {
            return Err(Error::TransactionNotFound(transaction_id.to_string()));
        }
        Ok(transaction)
    }
}

fn log_failure(context: &str, err: &Error) {
    match err.kind() {
        ErrorKind::BusinessRule | ErrorKind::NotFound => debug!("{} rejected: {}", context, err),
        ErrorKind::Conflict | ErrorKind::Upstream => warn!("{} failed: {}", context, err),
        ErrorKind::Store | ErrorKind::Internal => error!("{} failed: {}", context, err),
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn apply_trade(&self, trade: NewTrade) -> Result<TradeOutcome> {
        let trade = trade.normalized();
        trade.validate()?;
        let total_amount = trade.total_amount()?;
        self.ensure_user(&trade.user_id)?;
        // A sell can only succeed against an existing holding, whose asset is
        // already cataloged.
        if trade.trade_type == TradeType::Buy {
            self.asset_service.ensure_asset(&trade.symbol).await?;
        }

        let context = format!(
            "{} {} {} for {}",
            trade.trade_type, trade.quantity, trade.symbol, trade.user_id
        );
        let guard = self
            .trade_locks
            .acquire(&trade.user_id, &trade.symbol)
            .await;

        let mut attempt = 0;
        let outcome = loop {
            let commit = match self.prepare_commit(&trade, total_amount) {
                Ok(commit) => commit,
                Err(e) => {
                    log_failure(&context, &e);
                    return Err(e);
                }
            };

            match self.ledger_repository.commit_trade(commit).await {
                Ok(outcome) => break outcome,
                Err(Error::ConcurrencyConflict { .. }) if attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    warn!("{}: holding changed underneath, retrying with fresh state", context);
                }
                Err(e) => {
                    log_failure(&context, &e);
                    return Err(e);
                }
            }
        };
        drop(guard);

        info!(
            "Applied {}: holding now {}",
            context,
            outcome
                .holding
                .as_ref()
                .map(|h| format!("{} @ {}", h.quantity, h.average_cost))
                .unwrap_or_else(|| "closed".to_string())
        );
        self.event_sink.emit(DomainEvent::trade_applied(&outcome));
        Ok(outcome)
    }

    fn get_holdings(&self, user_id: &str) -> Result<Vec<Holding>> {
        self.ensure_user(user_id)?;
        self.ledger_repository.list_holdings(user_id)
    }

    fn get_holding(&self, user_id: &str, symbol: &str) -> Result<Option<Holding>> {
        self.ensure_user(user_id)?;
        self.ledger_repository
            .get_holding(user_id, &symbol.trim().to_uppercase())
    }

    fn get_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        self.ensure_user(user_id)?;
        let filter = TransactionFilter {
            symbol: filter.symbol.as_ref().map(|s| s.trim().to_uppercase()),
            ..filter.clone()
        };
        self.ledger_repository.list_transactions(user_id, &filter)
    }

    fn get_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Transaction> {
        self.ensure_user(user_id)?;
        self.owned_transaction(user_id, transaction_id)
    }

    async fn update_transaction(
        &self,
        user_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        update.validate()?;
        self.ensure_user(user_id)?;
        let existing = self.owned_transaction(user_id, &update.id)?;

        let corrected = update.apply_to(existing)?;
        let saved = self.ledger_repository.update_transaction(corrected).await?;

        warn!(
            "Transaction {} on {} corrected; holding for {}/{} was not re-derived",
            saved.id, saved.symbol, saved.user_id, saved.symbol
        );
        self.event_sink.emit(DomainEvent::transaction_corrected(
            saved.user_id.clone(),
            saved.symbol.clone(),
            saved.id.clone(),
        ));
        Ok(saved)
    }

    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<()> {
        self.ensure_user(user_id)?;
        let existing = self.owned_transaction(user_id, transaction_id)?;

        let deleted = self
            .ledger_repository
            .delete_transaction(transaction_id)
            .await?;
        if deleted == 0 {
            return Err(Error::TransactionNotFound(transaction_id.to_string()));
        }

        warn!(
            "Transaction {} on {} deleted; holding for {}/{} was not re-derived",
            existing.id, existing.symbol, existing.user_id, existing.symbol
        );
        self.event_sink.emit(DomainEvent::transaction_deleted(
            existing.user_id,
            existing.symbol,
            existing.id,
        ));
        Ok(())
    }
}
