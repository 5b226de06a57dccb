//! Portfolio snapshots - the historical series behind performance views.

mod snapshot_model;
mod snapshot_traits;

pub use snapshot_model::{NewPortfolioSnapshot, PortfolioSnapshot};
pub use snapshot_traits::SnapshotRepositoryTrait;
