//! Repository trait for portfolio snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::snapshot_model::{NewPortfolioSnapshot, PortfolioSnapshot};
use crate::errors::Result;

/// Append-only store of portfolio valuations.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    async fn append(&self, snapshot: NewPortfolioSnapshot) -> Result<PortfolioSnapshot>;

    /// Snapshots of a user taken at or after `since`, oldest first.
    fn list_since(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PortfolioSnapshot>>;
}
