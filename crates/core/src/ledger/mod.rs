//! Cost-basis ledger - holdings and the transactions that produce them.

pub mod cost_basis;
mod ledger_model;
mod ledger_service;
mod ledger_traits;
mod trade_locks;


pub use cost_basis::Position;
pub use ledger_model::{
    total_amount, Holding, HoldingChange, NewTrade, TradeCommit, TradeOutcome, TradeType,
    Transaction, TransactionFilter, TransactionUpdate,
};
pub use ledger_service::LedgerService;
pub use ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
pub use trade_locks::{TradeGuard, TradeLocks};
