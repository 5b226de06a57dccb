//! SQLite storage implementation for Ledgerfolio.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `ledgerfolio-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for users, assets, the ledger and snapshots
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place where Diesel dependencies exist. The core crate
//! is database-agnostic and works with traits.
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```
//!
//! Reads go through the r2d2 pool. Every write is a job on a single writer
//! task that wraps it in an `IMMEDIATE` transaction, so a trade's transaction
//! row and holding change commit or roll back together.

use std::sync::Arc;

use ledgerfolio_core::EngineRepositories;

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod assets;
pub mod ledger;
pub mod portfolio;
pub mod users;

#[cfg(test)]
mod test_utils;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, open, run_migrations, spawn_writer,
    DbConnection, DbPool, WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from ledgerfolio-core for convenience
pub use ledgerfolio_core::errors::{DatabaseError, Error, Result};

pub use assets::AssetRepository;
pub use ledger::LedgerRepository;
pub use portfolio::snapshot::SnapshotRepository;
pub use users::UserRepository;

/// Builds every engine repository on one pool and writer.
pub fn repositories(pool: Arc<DbPool>, writer: WriteHandle) -> EngineRepositories {
    EngineRepositories {
        users: Arc::new(UserRepository::new(pool.clone(), writer.clone())),
        assets: Arc::new(AssetRepository::new(pool.clone(), writer.clone())),
        ledger: Arc::new(LedgerRepository::new(pool.clone(), writer.clone())),
        snapshots: Arc::new(SnapshotRepository::new(pool, writer)),
    }
}

/// Opens the database under `app_data_dir` and returns repositories backed by it.
/// Must run inside a Tokio runtime.
pub fn open_repositories(app_data_dir: &str) -> Result<EngineRepositories> {
    let (pool, writer) = open(app_data_dir)?;
    Ok(repositories(pool, writer))
}
