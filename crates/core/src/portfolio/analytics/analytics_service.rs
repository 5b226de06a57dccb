use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, warn};

use super::analytics_traits::AnalyticsServiceTrait;
use crate::assets::{Asset, AssetServiceTrait};
use crate::config::EngineConfig;
use crate::errors::{Error, Result};
use crate::ledger::{Holding, LedgerRepositoryTrait};
use crate::portfolio::allocation::{self, AllocationBreakdown};
use crate::portfolio::performance::{
    best_and_worst, holding_returns, period_change, PerformancePeriod, PerformanceSummary,
};
use crate::portfolio::risk::{self, RiskAssessment};
use crate::portfolio::snapshot::{NewPortfolioSnapshot, SnapshotRepositoryTrait};
use crate::portfolio::valuation::{
    day_change_percent, value_holdings, PortfolioSummary, PortfolioValuation,
};
use crate::quotes::QuoteClient;
use crate::users::UserRepositoryTrait;
use crate::utils::decimal_utils::percentage_of;

pub struct AnalyticsService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    asset_service: Arc<dyn AssetServiceTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    quote_client: QuoteClient,
    config: Arc<EngineConfig>,
}

impl AnalyticsService {
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        asset_service: Arc<dyn AssetServiceTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        quote_client: QuoteClient,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            ledger_repository,
            user_repository,
            asset_service,
            snapshot_repository,
            quote_client,
            config,
        }
    }

    fn load_holdings(&self, user_id: &str) -> Result<Vec<Holding>> {
        if self.user_repository.get_by_id(user_id)?.is_none() {
            return Err(Error::UserNotFound(user_id.to_string()));
        }
        self.ledger_repository.list_holdings(user_id)
    }

    fn asset_map(&self, holdings: &[Holding]) -> Result<HashMap<String, Asset>> {
        let symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();
        Ok(self
            .asset_service
            .get_assets_or_unlisted(&symbols)?
            .into_iter()
            .map(|a| (a.symbol.clone(), a))
            .collect())
    }

    /// Holdings priced against one quote snapshot.
    async fn value(&self, user_id: &str) -> Result<PortfolioValuation> {
        let holdings = self.load_holdings(user_id)?;
        let assets = self.asset_map(&holdings)?;
        let symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();

        let prices = self.quote_client.fetch_quotes(&symbols).await;
        for (symbol, err) in prices.failures() {
            debug!("Quote for {} unavailable: {}", symbol, err);
        }
        Ok(value_holdings(&holdings, &assets, &prices))
    }
}

#[async_trait]
impl AnalyticsServiceTrait for AnalyticsService {
    async fn get_portfolio_summary(&self, user_id: &str) -> Result<PortfolioSummary> {
        let valuation = self.value(user_id).await?;

        Ok(PortfolioSummary {
            user_id: user_id.to_string(),
            holding_count: valuation.holdings.len(),
            unrealized_pnl_percent: percentage_of(valuation.unrealized_pnl, valuation.total_cost),
            day_change_percent: day_change_percent(valuation.total_value, valuation.day_change),
            total_value: valuation.total_value,
            total_cost: valuation.total_cost,
            unrealized_pnl: valuation.unrealized_pnl,
            day_change: valuation.day_change,
            holdings: valuation.holdings,
            warnings: valuation.warnings,
            as_of: Utc::now(),
        })
    }

    async fn get_performance_analytics(
        &self,
        user_id: &str,
        period: PerformancePeriod,
    ) -> Result<PerformanceSummary> {
        let valuation = self.value(user_id).await?;
        let mut warnings = valuation.warnings.clone();
        let now = Utc::now();

        let snapshot = NewPortfolioSnapshot {
            user_id: user_id.to_string(),
            taken_at: now,
            total_value: valuation.total_value,
            total_cost: valuation.total_cost,
            unrealized_pnl: valuation.unrealized_pnl,
        };
        if let Err(e) = self.snapshot_repository.append(snapshot).await {
            error!("Failed to record portfolio snapshot for {}: {}", user_id, e);
            warnings.push(format!("Portfolio snapshot could not be recorded: {}", e));
        }

        let history = match self.snapshot_repository.list_since(user_id, period.start(now)) {
            Ok(history) => history,
            Err(e) => {
                warn!("Failed to load snapshot history for {}: {}", user_id, e);
                warnings.push(format!("Performance history unavailable: {}", e));
                Vec::new()
            }
        };

        let holdings = holding_returns(&valuation);
        let (best_performer, worst_performer) = best_and_worst(&holdings);
        let (period_change, period_change_percent) = period_change(&history, valuation.total_value);
        let total_return = valuation.total_value - valuation.total_cost;

        Ok(PerformanceSummary {
            user_id: user_id.to_string(),
            period,
            current_value: valuation.total_value,
            total_cost: valuation.total_cost,
            total_return,
            total_return_percent: percentage_of(total_return, valuation.total_cost),
            day_change: valuation.day_change,
            day_change_percent: day_change_percent(valuation.total_value, valuation.day_change),
            best_performer,
            worst_performer,
            holdings,
            history,
            period_change,
            period_change_percent,
            warnings,
            as_of: now,
        })
    }

    fn get_risk_metrics(&self, user_id: &str) -> Result<RiskAssessment> {
        let holdings = self.load_holdings(user_id)?;
        let assets = self.asset_map(&holdings)?;
        Ok(risk::assess(
            user_id,
            &holdings,
            &assets,
            &self.config.risk,
            &self.config.symbols,
        ))
    }

    fn get_asset_allocation(&self, user_id: &str) -> Result<AllocationBreakdown> {
        let holdings = self.load_holdings(user_id)?;
        let assets = self.asset_map(&holdings)?;
        Ok(allocation::breakdown(
            user_id,
            &holdings,
            &assets,
            self.config.top_holdings,
        ))
    }
}
