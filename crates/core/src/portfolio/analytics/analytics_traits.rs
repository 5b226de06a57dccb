use async_trait::async_trait;

use crate::errors::Result;
use crate::portfolio::allocation::AllocationBreakdown;
use crate::portfolio::performance::{PerformancePeriod, PerformanceSummary};
use crate::portfolio::risk::RiskAssessment;
use crate::portfolio::valuation::PortfolioSummary;

/// Read-side views over a user's holdings.
///
/// Summary and performance price holdings against live quotes and degrade to
/// average cost when a quote is missing. Risk and allocation work on cost basis
/// only and never touch the quote provider.
#[async_trait]
pub trait AnalyticsServiceTrait: Send + Sync {
    async fn get_portfolio_summary(&self, user_id: &str) -> Result<PortfolioSummary>;

    /// Also appends a snapshot of the current totals to the history.
    async fn get_performance_analytics(
        &self,
        user_id: &str,
        period: PerformancePeriod,
    ) -> Result<PerformanceSummary>;

    fn get_risk_metrics(&self, user_id: &str) -> Result<RiskAssessment>;

    fn get_asset_allocation(&self, user_id: &str) -> Result<AllocationBreakdown>;
}
