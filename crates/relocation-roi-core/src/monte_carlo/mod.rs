//! Monte Carlo simulation of relocation outcomes under correlated shocks.

pub mod config;
pub mod sampling;
pub mod simulation;

pub use config::{MonteCarloConfig, ShockParameters};
pub use simulation::{run_monte_carlo, MonteCarloSimulator, MonteCarloSummary};
