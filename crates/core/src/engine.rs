//! Service wiring.
//!
//! [`PortfolioEngine`] builds every service from a set of repositories and a quote
//! provider, and exposes the caller-facing operations in one place.

use std::sync::Arc;

use log::info;
use tokio::task::JoinHandle;

use ledgerfolio_market_data::QuoteProvider;

use crate::assets::{AssetRepositoryTrait, AssetService, AssetServiceTrait};
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::events::{DomainEventSink, FanOutDomainEventSink};
use crate::ledger::{
    Holding, LedgerRepositoryTrait, LedgerService, LedgerServiceTrait, NewTrade, TradeOutcome,
    Transaction, TransactionFilter, TransactionUpdate,
};
use crate::memory::InMemoryStore;
use crate::portfolio::allocation::AllocationBreakdown;
use crate::portfolio::analytics::{AnalyticsService, AnalyticsServiceTrait};
use crate::portfolio::performance::{PerformancePeriod, PerformanceSummary};
use crate::portfolio::risk::RiskAssessment;
use crate::portfolio::snapshot::SnapshotRepositoryTrait;
use crate::portfolio::valuation::PortfolioSummary;
use crate::quotes::QuoteClient;
use crate::realtime::{
    spawn_hub, Channel, ClientConnection, HubEvent, HubEventSink, HubHandle, PriceFeed,
};
use crate::simulation::{SimulationService, SimulationServiceTrait, WhatIfRequest, WhatIfResult};
use crate::users::{NewUser, User, UserRepositoryTrait, UserService, UserServiceTrait};

/// Storage backends the engine runs on.
#[derive(Clone)]
pub struct EngineRepositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub assets: Arc<dyn AssetRepositoryTrait>,
    pub ledger: Arc<dyn LedgerRepositoryTrait>,
    pub snapshots: Arc<dyn SnapshotRepositoryTrait>,
}

impl EngineRepositories {
    /// All four repositories backed by one [`InMemoryStore`].
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            assets: store.clone(),
            ledger: store.clone(),
            snapshots: store,
        }
    }
}

pub struct PortfolioEngine {
    config: Arc<EngineConfig>,
    quote_client: QuoteClient,
    hub: HubHandle,
    user_service: Arc<dyn UserServiceTrait>,
    asset_service: Arc<dyn AssetServiceTrait>,
    ledger_service: Arc<dyn LedgerServiceTrait>,
    analytics_service: Arc<dyn AnalyticsServiceTrait>,
    simulation_service: Arc<dyn SimulationServiceTrait>,
}

impl PortfolioEngine {
    /// Builds the engine and spawns the realtime hub. Must run inside a Tokio runtime.
    pub fn new(
        config: EngineConfig,
        repositories: EngineRepositories,
        provider: Arc<dyn QuoteProvider>,
    ) -> Result<Self> {
        Self::with_event_sinks(config, repositories, provider, Vec::new())
    }

    /// Like [`new`](Self::new), also forwarding domain events to `extra_sinks`.
    pub fn with_event_sinks(
        config: EngineConfig,
        repositories: EngineRepositories,
        provider: Arc<dyn QuoteProvider>,
        extra_sinks: Vec<Arc<dyn DomainEventSink>>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let quote_client = QuoteClient::new(provider, config.quote_timeout());
        let hub = spawn_hub(&config.hub);

        let mut sink = FanOutDomainEventSink::new(extra_sinks);
        sink.push(Arc::new(HubEventSink::new(hub.clone())));
        let event_sink: Arc<dyn DomainEventSink> = Arc::new(sink);

        let user_service = Arc::new(UserService::new(repositories.users.clone()));
        let asset_service = Arc::new(AssetService::new(
            repositories.assets.clone(),
            quote_client.clone(),
            event_sink.clone(),
        ));
        let ledger_service = Arc::new(LedgerService::new(
            repositories.ledger.clone(),
            repositories.users.clone(),
            asset_service.clone(),
            event_sink,
        ));
        let analytics_service = Arc::new(AnalyticsService::new(
            repositories.ledger.clone(),
            repositories.users.clone(),
            asset_service.clone(),
            repositories.snapshots.clone(),
            quote_client.clone(),
            config.clone(),
        ));
        let simulation_service = Arc::new(SimulationService::new(
            repositories.ledger,
            repositories.users,
            asset_service.clone(),
            quote_client.clone(),
            config.clone(),
        ));

        info!(
            "Portfolio engine ready (quote provider {}, timeout {}ms)",
            quote_client.provider_id(),
            config.quote_timeout_ms
        );

        Ok(Self {
            config,
            quote_client,
            hub,
            user_service,
            asset_service,
            ledger_service,
            analytics_service,
            simulation_service,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn users(&self) -> Arc<dyn UserServiceTrait> {
        self.user_service.clone()
    }

    pub fn assets(&self) -> Arc<dyn AssetServiceTrait> {
        self.asset_service.clone()
    }

    pub fn ledger(&self) -> Arc<dyn LedgerServiceTrait> {
        self.ledger_service.clone()
    }

    pub fn analytics(&self) -> Arc<dyn AnalyticsServiceTrait> {
        self.analytics_service.clone()
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_service.create_user(new_user).await
    }

    pub async fn apply_trade(&self, trade: NewTrade) -> Result<TradeOutcome> {
        self.ledger_service.apply_trade(trade).await
    }

    pub fn get_holdings(&self, user_id: &str) -> Result<Vec<Holding>> {
        self.ledger_service.get_holdings(user_id)
    }

    pub fn get_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        self.ledger_service.get_transactions(user_id, filter)
    }

    pub async fn update_transaction(
        &self,
        user_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        self.ledger_service.update_transaction(user_id, update).await
    }

    pub async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<()> {
        self.ledger_service.delete_transaction(user_id, transaction_id).await
    }

    pub async fn get_portfolio_summary(&self, user_id: &str) -> Result<PortfolioSummary> {
        self.analytics_service.get_portfolio_summary(user_id).await
    }

    pub fn get_risk_metrics(&self, user_id: &str) -> Result<RiskAssessment> {
        self.analytics_service.get_risk_metrics(user_id)
    }

    pub async fn get_performance_analytics(
        &self,
        user_id: &str,
        period: PerformancePeriod,
    ) -> Result<PerformanceSummary> {
        self.analytics_service
            .get_performance_analytics(user_id, period)
            .await
    }

    pub fn get_asset_allocation(&self, user_id: &str) -> Result<AllocationBreakdown> {
        self.analytics_service.get_asset_allocation(user_id)
    }

    pub async fn simulate_what_if(
        &self,
        user_id: &str,
        request: WhatIfRequest,
    ) -> Result<WhatIfResult> {
        self.simulation_service.simulate(user_id, request).await
    }

    pub async fn connect(&self, user_id: &str) -> Result<ClientConnection> {
        self.hub.connect(user_id).await
    }

    /// Connects and subscribes in one step, parsing each channel name.
    pub async fn connect_with(&self, user_id: &str, channels: &[&str]) -> Result<ClientConnection> {
        let client = self.hub.connect(user_id).await?;
        for name in channels {
            client.subscribe(name.parse::<Channel>()?).await?;
        }
        Ok(client)
    }

    pub async fn publish(&self, event: HubEvent) -> Result<usize> {
        self.hub.publish(event).await
    }

    /// Starts the background price feed on the configured interval and watch list.
    pub fn start_price_feed(&self) -> JoinHandle<()> {
        let feed = Arc::new(PriceFeed::new(
            self.hub.clone(),
            self.quote_client.clone(),
            self.config.watchlist.clone(),
        ));
        feed.spawn(self.config.price_feed_interval())
    }

    /// Stops the hub and disconnects every client. The price feed exits on its next tick.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down portfolio engine");
        self.hub.shutdown().await
    }
}
