//! Ledgerfolio Core - Domain entities, services, and traits.
//!
//! This crate contains the cost-basis ledger, the analytics engine, the what-if
//! simulator and the realtime hub. It is database-agnostic and defines traits
//! that are implemented by the `storage-sqlite` crate; [`memory::InMemoryStore`]
//! implements them in process.

pub mod assets;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod memory;
pub mod portfolio;
pub mod quotes;
pub mod realtime;
pub mod simulation;
pub mod users;
pub mod utils;

pub use config::EngineConfig;
pub use engine::{EngineRepositories, PortfolioEngine};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
