//! Allocation view: cost-basis breakdown by asset type, sector and top positions.

mod allocation_calculator;
mod allocation_model;

pub use allocation_calculator::{allocation_by, breakdown, top_holdings, AllocationKey};
pub use allocation_model::{AllocationBreakdown, AllocationSlice, TopHolding};
