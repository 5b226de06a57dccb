use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;

use ledgerfolio_core::assets::{Asset, AssetRepositoryTrait, NewAsset};
use ledgerfolio_core::errors::{DatabaseError, Error, Result};

use super::model::AssetDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::assets;
use crate::utils::chunk_for_sqlite;

pub struct AssetRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AssetRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl AssetRepositoryTrait for AssetRepository {
    async fn create(&self, new_asset: NewAsset) -> Result<Asset> {
        let asset = Asset {
            symbol: new_asset.symbol,
            name: new_asset.name,
            asset_type: new_asset.asset_type,
            sector: new_asset.sector,
            created_at: Utc::now(),
        };
        let row = AssetDB::from(&asset);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Asset> {
                diesel::insert_into(assets::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(asset)
            })
            .await
    }

    fn get_by_symbol(&self, symbol: &str) -> Result<Asset> {
        let mut conn = get_connection(&self.pool)?;
        let row = assets::table
            .find(symbol)
            .select(AssetDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("asset {}", symbol))))?;
        Ok(Asset::try_from(row)?)
    }

    fn list_by_symbols(&self, symbols: &[String]) -> Result<Vec<Asset>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let mut found = Vec::with_capacity(symbols.len());
        for chunk in chunk_for_sqlite(symbols) {
            let rows = assets::table
                .filter(assets::symbol.eq_any(chunk))
                .select(AssetDB::as_select())
                .load(&mut conn)
                .map_err(StorageError::from)?;
            for row in rows {
                found.push(Asset::try_from(row)?);
            }
        }
        debug!("Loaded {} of {} catalog entries", found.len(), symbols.len());
        Ok(found)
    }
}
