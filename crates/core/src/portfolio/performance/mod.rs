//! Performance views: returns per holding and the snapshot history.

mod performance_calculator;
mod performance_model;

pub use performance_calculator::{best_and_worst, holding_returns, period_change};
pub use performance_model::{HoldingReturn, PerformancePeriod, PerformanceSummary};
