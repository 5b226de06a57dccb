//! Database model for assets.

use diesel::prelude::*;

use ledgerfolio_core::assets::Asset;

use crate::errors::StorageError;
use crate::utils::{parse_timestamp, timestamp_to_text};

/// Database model for assets
#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::assets)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetDB {
    pub symbol: String,
    pub name: String,
    pub asset_type: String,
    pub sector: String,
    pub created_at: String,
}

impl TryFrom<AssetDB> for Asset {
    type Error = StorageError;

    fn try_from(db: AssetDB) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp(&db.created_at, "assets.created_at")?,
            symbol: db.symbol,
            name: db.name,
            asset_type: db.asset_type,
            sector: db.sector,
        })
    }
}

impl From<&Asset> for AssetDB {
    fn from(asset: &Asset) -> Self {
        Self {
            symbol: asset.symbol.clone(),
            name: asset.name.clone(),
            asset_type: asset.asset_type.clone(),
            sector: asset.sector.clone(),
            created_at: timestamp_to_text(asset.created_at),
        }
    }
}
