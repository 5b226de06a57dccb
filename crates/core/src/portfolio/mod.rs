//! Portfolio analytics: valuation, performance, risk and allocation views.

pub mod allocation;
pub mod analytics;
pub mod performance;
pub mod risk;
pub mod snapshot;
pub mod valuation;

pub use analytics::{AnalyticsService, AnalyticsServiceTrait};
