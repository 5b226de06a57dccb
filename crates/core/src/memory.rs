//! In-process implementation of every repository trait.
//!
//! Backs offline engine runs and the service tests. All state sits behind one
//! mutex so a trade commit is atomic with respect to readers, the same guarantee
//! the SQLite writer gives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::assets::{Asset, AssetRepositoryTrait, NewAsset};
use crate::errors::{DatabaseError, Error, Result};
use crate::ledger::{
    Holding, HoldingChange, LedgerRepositoryTrait, TradeCommit, TradeOutcome, Transaction,
    TransactionFilter,
};
use crate::portfolio::snapshot::{NewPortfolioSnapshot, PortfolioSnapshot, SnapshotRepositoryTrait};
use crate::users::{NewUser, User, UserRepositoryTrait};

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    assets: HashMap<String, Asset>,
    holdings: HashMap<(String, String), Holding>,
    transactions: Vec<Transaction>,
    snapshots: Vec<PortfolioSnapshot>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    fail_snapshots: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every ledger write fail with a store error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes snapshot reads and writes fail with a store error.
    pub fn set_fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    /// Number of transactions recorded across all users.
    pub fn transaction_count(&self) -> usize {
        self.lock().transactions.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryFailed("ledger store unavailable".to_string()).into());
        }
        Ok(())
    }

    fn check_snapshots(&self) -> Result<()> {
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(DatabaseError::QueryFailed("snapshot store unavailable".to_string()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: new_user.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: new_user.name,
            created_at: Utc::now(),
        };
        let mut state = self.lock();
        if state.users.contains_key(&user.id) {
            return Err(DatabaseError::UniqueViolation(format!("user {}", user.id)).into());
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.lock().users.get(user_id).cloned())
    }
}

#[async_trait]
impl AssetRepositoryTrait for InMemoryStore {
    async fn create(&self, new_asset: NewAsset) -> Result<Asset> {
        let mut state = self.lock();
        if state.assets.contains_key(&new_asset.symbol) {
            let message = format!("asset {}", new_asset.symbol);
            return Err(DatabaseError::UniqueViolation(message).into());
        }
        let asset = Asset {
            symbol: new_asset.symbol,
            name: new_asset.name,
            asset_type: new_asset.asset_type,
            sector: new_asset.sector,
            created_at: Utc::now(),
        };
        state.assets.insert(asset.symbol.clone(), asset.clone());
        Ok(asset)
    }

    fn get_by_symbol(&self, symbol: &str) -> Result<Asset> {
        self.lock()
            .assets
            .get(symbol)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("asset {}", symbol)).into())
    }

    fn list_by_symbols(&self, symbols: &[String]) -> Result<Vec<Asset>> {
        let state = self.lock();
        Ok(symbols
            .iter()
            .filter_map(|s| state.assets.get(s).cloned())
            .collect())
    }
}

#[async_trait]
impl LedgerRepositoryTrait for InMemoryStore {
    fn get_holding(&self, user_id: &str, symbol: &str) -> Result<Option<Holding>> {
        Ok(self
            .lock()
            .holdings
            .get(&(user_id.to_string(), symbol.to_string()))
            .cloned())
    }

    fn list_holdings(&self, user_id: &str) -> Result<Vec<Holding>> {
        let mut holdings: Vec<Holding> = self
            .lock()
            .holdings
            .values()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(holdings)
    }

    async fn commit_trade(&self, commit: TradeCommit) -> Result<TradeOutcome> {
        self.check_writes()?;
        let key = (commit.user_id.clone(), commit.symbol.clone());
        let mut state = self.lock();

        let current_version = state.holdings.get(&key).map(|h| h.version);
        if current_version != commit.expected_version {
            return Err(Error::ConcurrencyConflict {
                user_id: commit.user_id,
                symbol: commit.symbol,
            });
        }

        state.transactions.push(commit.transaction.clone());
        let holding = match commit.holding_change {
            HoldingChange::Upsert(holding) => {
                state.holdings.insert(key, holding.clone());
                Some(holding)
            }
            HoldingChange::Delete { .. } => {
                state.holdings.remove(&key);
                None
            }
        };

        Ok(TradeOutcome {
            transaction: commit.transaction,
            holding,
        })
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.lock()
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("transaction {}", transaction_id)).into()
            })
    }

    fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let state = self.lock();
        // Reverse insertion order so equal timestamps still list newest first.
        let mut transactions: Vec<Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .filter(|t| filter.symbol.as_deref().map_or(true, |s| t.symbol == s))
            .filter(|t| filter.trade_type.map_or(true, |tt| t.trade_type == tt))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.executed_at.cmp(&a.executed_at));
        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }
        Ok(transactions)
    }

    async fn update_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        self.check_writes()?;
        let mut state = self.lock();
        let slot = state
            .transactions
            .iter_mut()
            .find(|t| t.id == transaction.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("transaction {}", transaction.id)))?;
        *slot = transaction.clone();
        Ok(transaction)
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<usize> {
        self.check_writes()?;
        let mut state = self.lock();
        let before = state.transactions.len();
        state.transactions.retain(|t| t.id != transaction_id);
        Ok(before - state.transactions.len())
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for InMemoryStore {
    async fn append(&self, snapshot: NewPortfolioSnapshot) -> Result<PortfolioSnapshot> {
        self.check_snapshots()?;
        let snapshot = PortfolioSnapshot {
            id: Uuid::new_v4().to_string(),
            user_id: snapshot.user_id,
            taken_at: snapshot.taken_at,
            total_value: snapshot.total_value,
            total_cost: snapshot.total_cost,
            unrealized_pnl: snapshot.unrealized_pnl,
        };
        self.lock().snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    fn list_since(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PortfolioSnapshot>> {
        self.check_snapshots()?;
        let mut snapshots: Vec<PortfolioSnapshot> = self
            .lock()
            .snapshots
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter(|s| since.map_or(true, |start| s.taken_at >= start))
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| a.taken_at.cmp(&b.taken_at));
        Ok(snapshots)
    }
}
