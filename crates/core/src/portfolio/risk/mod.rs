//! Risk view: sector concentration plus heuristic market-risk figures.

mod risk_calculator;
mod risk_model;

pub use risk_calculator::{
    assess, concentration_level, herfindahl_index, portfolio_beta, sector_exposure,
    HIGH_CONCENTRATION_HHI, MEDIUM_CONCENTRATION_HHI,
};
pub use risk_model::{PositionWeight, RiskAssessment, RiskLevel, SectorExposure};
