//! SQLite storage implementation for portfolio snapshots.

mod model;
mod repository;

pub use model::PortfolioSnapshotDB;
pub use repository::SnapshotRepository;
