//! Database model for portfolio snapshots.

use diesel::prelude::*;

use ledgerfolio_core::portfolio::snapshot::PortfolioSnapshot;

use crate::errors::StorageError;
use crate::utils::{decimal_to_text, parse_decimal, parse_timestamp, timestamp_to_text};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::portfolio_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioSnapshotDB {
    pub id: String,
    pub user_id: String,
    pub taken_at: String,
    pub total_value: String,
    pub total_cost: String,
    pub unrealized_pnl: String,
}

impl TryFrom<PortfolioSnapshotDB> for PortfolioSnapshot {
    type Error = StorageError;

    fn try_from(db: PortfolioSnapshotDB) -> Result<Self, Self::Error> {
        Ok(Self {
            taken_at: parse_timestamp(&db.taken_at, "portfolio_snapshots.taken_at")?,
            total_value: parse_decimal(&db.total_value, "portfolio_snapshots.total_value")?,
            total_cost: parse_decimal(&db.total_cost, "portfolio_snapshots.total_cost")?,
            unrealized_pnl: parse_decimal(
                &db.unrealized_pnl,
                "portfolio_snapshots.unrealized_pnl",
            )?,
            id: db.id,
            user_id: db.user_id,
        })
    }
}

impl From<&PortfolioSnapshot> for PortfolioSnapshotDB {
    fn from(snapshot: &PortfolioSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            user_id: snapshot.user_id.clone(),
            taken_at: timestamp_to_text(snapshot.taken_at),
            total_value: decimal_to_text(snapshot.total_value),
            total_cost: decimal_to_text(snapshot.total_cost),
            unrealized_pnl: decimal_to_text(snapshot.unrealized_pnl),
        }
    }
}
