//! One-at-a-time sensitivity sweeps and the named macro scenarios.

pub mod scenario;
pub mod sensitivity;

pub use scenario::{run_scenarios, ScenarioAnalysis, ScenarioKind, ScenarioOutcome};
pub use sensitivity::{run_sensitivity_analysis, SensitivityAnalysis, SensitivityVariable};
