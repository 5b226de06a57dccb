//! What-if simulator.

mod simulation_model;
mod simulation_service;
mod simulation_traits;

#[cfg(test)]
mod simulation_service_tests;

pub use simulation_model::{
    AllocationShift, DiversificationImpact, PositionView, WhatIfAction, WhatIfRequest, WhatIfResult,
};
pub use simulation_service::SimulationService;
pub use simulation_traits::SimulationServiceTrait;
