//! The orchestrator: one call per (persona, country) pair composing the
//! projection, simulation, sensitivity, scenarios and scoring.

pub mod calculator;
pub mod comparison;
pub mod config;

pub use calculator::{calculate_comprehensive_roi, CalculationResult, RoiEngine};
pub use comparison::{CountryComparison, CountryRanking};
pub use config::EngineConfig;
