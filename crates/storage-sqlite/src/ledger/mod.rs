//! SQLite storage implementation for holdings and transactions.

mod model;
mod repository;

#[cfg(test)]
mod repository_tests;

pub use model::{HoldingDB, TransactionDB};
pub use repository::LedgerRepository;
