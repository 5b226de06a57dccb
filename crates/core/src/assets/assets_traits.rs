use async_trait::async_trait;

use super::assets_model::{Asset, NewAsset};
use crate::errors::Result;

/// Trait defining the contract for Asset repository operations.
#[async_trait]
pub trait AssetRepositoryTrait: Send + Sync {
    /// Inserts a catalog entry. Fails with `UniqueViolation` if the symbol exists.
    async fn create(&self, new_asset: NewAsset) -> Result<Asset>;

    /// Fails with `DatabaseError::NotFound` for unknown symbols.
    fn get_by_symbol(&self, symbol: &str) -> Result<Asset>;

    /// Returns the known subset of `symbols`, in no particular order.
    fn list_by_symbols(&self, symbols: &[String]) -> Result<Vec<Asset>>;
}

/// Trait defining the contract for Asset service operations.
#[async_trait]
pub trait AssetServiceTrait: Send + Sync {
    /// Returns the catalog entry, creating it from the provider profile on first use.
    async fn ensure_asset(&self, symbol: &str) -> Result<Asset>;

    fn get_asset(&self, symbol: &str) -> Result<Asset>;

    /// Catalog entries for `symbols`; unknown symbols get an unlisted placeholder.
    fn get_assets_or_unlisted(&self, symbols: &[String]) -> Result<Vec<Asset>>;
}
