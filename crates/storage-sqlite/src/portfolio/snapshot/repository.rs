use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use uuid::Uuid;

use ledgerfolio_core::errors::{Error, Result};
use ledgerfolio_core::portfolio::snapshot::{
    NewPortfolioSnapshot, PortfolioSnapshot, SnapshotRepositoryTrait,
};

use super::model::PortfolioSnapshotDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::portfolio_snapshots;
use crate::utils::timestamp_to_text;

pub struct SnapshotRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    async fn append(&self, snapshot: NewPortfolioSnapshot) -> Result<PortfolioSnapshot> {
        let snapshot = PortfolioSnapshot {
            id: Uuid::now_v7().to_string(),
            user_id: snapshot.user_id,
            taken_at: snapshot.taken_at,
            total_value: snapshot.total_value,
            total_cost: snapshot.total_cost,
            unrealized_pnl: snapshot.unrealized_pnl,
        };
        let row = PortfolioSnapshotDB::from(&snapshot);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<PortfolioSnapshot> {
                diesel::insert_into(portfolio_snapshots::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(snapshot)
            })
            .await
    }

    fn list_since(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = portfolio_snapshots::table
            .select(PortfolioSnapshotDB::as_select())
            .into_boxed()
            .filter(portfolio_snapshots::user_id.eq(user_id));
        if let Some(start) = since {
            query = query.filter(portfolio_snapshots::taken_at.ge(timestamp_to_text(start)));
        }

        let rows = query
            .order((portfolio_snapshots::taken_at.asc(), portfolio_snapshots::id.asc()))
            .load(&mut conn)
            .map_err(StorageError::from)?;
        debug!("Loaded {} snapshots for user {} since {:?}", rows.len(), user_id, since);
        rows.into_iter()
            .map(|row| PortfolioSnapshot::try_from(row).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_db;
    use crate::users::UserRepository;
    use chrono::TimeZone;
    use ledgerfolio_core::users::{NewUser, UserRepositoryTrait};
    use rust_decimal_macros::dec;

    fn snapshot(user_id: &str, day: u32, value: rust_decimal::Decimal) -> NewPortfolioSnapshot {
        NewPortfolioSnapshot {
            user_id: user_id.to_string(),
            taken_at: Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap(),
            total_value: value,
            total_cost: dec!(1000),
            unrealized_pnl: value - dec!(1000),
        }
    }

    #[tokio::test]
    async fn test_list_since_is_oldest_first_and_user_scoped() {
        let (pool, writer, _dir) = test_db();
        let users = UserRepository::new(pool.clone(), writer.clone());
        for id in ["u1", "u2"] {
            users
                .create(NewUser {
                    id: Some(id.to_string()),
                    name: id.to_string(),
                })
                .await
                .unwrap();
        }
        let repo = SnapshotRepository::new(pool, writer);

        repo.append(snapshot("u1", 3, dec!(1030))).await.unwrap();
        repo.append(snapshot("u1", 1, dec!(1010))).await.unwrap();
        repo.append(snapshot("u1", 2, dec!(1020.5))).await.unwrap();
        repo.append(snapshot("u2", 2, dec!(5))).await.unwrap();

        let all = repo.list_since("u1", None).unwrap();
        let values: Vec<_> = all.iter().map(|s| s.total_value).collect();
        assert_eq!(values, vec![dec!(1010), dec!(1020.5), dec!(1030)]);
        assert_eq!(all[1].unrealized_pnl, dec!(20.5));

        let since = Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap();
        assert_eq!(repo.list_since("u1", Some(since)).unwrap().len(), 2);
        assert_eq!(repo.list_since("u2", None).unwrap().len(), 1);
        assert!(repo.list_since("nobody", None).unwrap().is_empty());
    }
}
