use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};

use super::assets_model::{Asset, NewAsset};
use super::assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
use crate::errors::{DatabaseError, Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::quotes::QuoteClient;

pub struct AssetService {
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    quote_client: QuoteClient,
    event_sink: Arc<dyn DomainEventSink>,
}

impl AssetService {
    pub fn new(
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        quote_client: QuoteClient,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            asset_repository,
            quote_client,
            event_sink,
        }
    }

    async fn describe(&self, symbol: &str) -> NewAsset {
        match self.quote_client.get_profile(symbol).await {
            Ok(profile) => NewAsset::from_profile(symbol, profile),
            Err(e) => {
                warn!(
                    "Profile lookup for {} failed ({}); cataloguing with symbol as name",
                    symbol, e
                );
                NewAsset::bare(symbol)
            }
        }
    }
}

#[async_trait]
impl AssetServiceTrait for AssetService {
    async fn ensure_asset(&self, symbol: &str) -> Result<Asset> {
        match self.asset_repository.get_by_symbol(symbol) {
            Ok(existing) => Ok(existing),
            Err(Error::Database(DatabaseError::NotFound(_))) => {
                debug!("Asset {} not in catalog, fetching profile", symbol);
                let new_asset = self.describe(symbol).await;

                match self.asset_repository.create(new_asset).await {
                    Ok(asset) => {
                        info!("Catalogued new asset {} ({})", asset.symbol, asset.name);
                        self.event_sink
                            .emit(DomainEvent::assets_created(vec![asset.symbol.clone()]));
                        Ok(asset)
                    }
                    // Another trade catalogued the symbol while the profile was in flight.
                    Err(Error::Database(DatabaseError::UniqueViolation(_))) => {
                        self.asset_repository.get_by_symbol(symbol)
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => {
                error!("Error fetching asset '{}': {}", symbol, e);
                Err(e)
            }
        }
    }

    fn get_asset(&self, symbol: &str) -> Result<Asset> {
        self.asset_repository.get_by_symbol(symbol)
    }

    fn get_assets_or_unlisted(&self, symbols: &[String]) -> Result<Vec<Asset>> {
        let mut known: HashMap<String, Asset> = self
            .asset_repository
            .list_by_symbols(symbols)?
            .into_iter()
            .map(|a| (a.symbol.clone(), a))
            .collect();

        Ok(symbols
            .iter()
            .map(|s| known.remove(s).unwrap_or_else(|| Asset::unlisted(s)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MockDomainEventSink;
    use crate::memory::InMemoryStore;
    use ledgerfolio_market_data::{CompanyProfile, StaticQuoteProvider};
    use std::time::Duration;

    fn service(provider: Arc<StaticQuoteProvider>) -> (AssetService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let client = QuoteClient::new(provider, Duration::from_millis(200));
        let sink = Arc::new(MockDomainEventSink::new());
        (AssetService::new(store.clone(), client, sink), store)
    }

    #[tokio::test]
    async fn test_ensure_asset_uses_profile() {
        let provider = Arc::new(StaticQuoteProvider::new());
        provider.set_profile(
            CompanyProfile::new("AAPL")
                .with_name("Apple Inc.")
                .with_sector("Technology"),
        );
        let store = Arc::new(InMemoryStore::new());
        let sink = Arc::new(MockDomainEventSink::new());
        let client = QuoteClient::new(provider, Duration::from_millis(200));
        let service = AssetService::new(store, client, sink.clone());

        let asset = service.ensure_asset("AAPL").await.unwrap();
        assert_eq!(
            sink.events(),
            vec![DomainEvent::assets_created(vec!["AAPL".to_string()])]
        );
        assert_eq!(asset.name, "Apple Inc.");
        assert_eq!(asset.sector, "Technology");
        assert_eq!(asset.asset_type, "Stock");
    }

    #[tokio::test]
    async fn test_ensure_asset_falls_back_to_symbol() {
        let provider = Arc::new(StaticQuoteProvider::new());
        provider.fail_symbol("ZZZ");
        let (service, _) = service(provider);

        let asset = service.ensure_asset("ZZZ").await.unwrap();
        assert_eq!(asset.name, "ZZZ");
        assert_eq!(asset.sector, "Unknown");
    }

    #[tokio::test]
    async fn test_ensure_asset_returns_existing_without_lookup() {
        let provider = Arc::new(StaticQuoteProvider::new());
        let (service, store) = service(provider.clone());
        store.create(NewAsset::bare("MSFT")).await.unwrap();

        provider.set_profile(CompanyProfile::new("MSFT").with_name("Microsoft"));
        let asset = service.ensure_asset("MSFT").await.unwrap();
        assert_eq!(asset.name, "MSFT");
    }

    #[tokio::test]
    async fn test_get_assets_or_unlisted_preserves_order() {
        let (service, store) = service(Arc::new(StaticQuoteProvider::new()));
        store.create(NewAsset::bare("B")).await.unwrap();

        let assets = service
            .get_assets_or_unlisted(&["A".to_string(), "B".to_string()])
            .unwrap();
        assert_eq!(assets[0].symbol, "A");
        assert_eq!(assets[0].created_at, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
        assert_eq!(assets[1].symbol, "B");
    }
}
