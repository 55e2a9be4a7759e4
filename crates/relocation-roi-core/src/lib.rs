pub mod cash_flow;
pub mod error;
pub mod input;
pub mod reference;
pub mod scoring;
pub mod time_value;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

#[cfg(feature = "monte_carlo")]
pub mod engine;

pub use cash_flow::{compute_base_metrics, BaseMetrics};
pub use error::EngineError;
pub use input::CalculationInput;
pub use reference::{Catalog, CountryProfile, Persona};
pub use types::*;

#[cfg(feature = "monte_carlo")]
pub use engine::{calculate_comprehensive_roi, CalculationResult, EngineConfig, RoiEngine};
#[cfg(feature = "monte_carlo")]
pub use monte_carlo::run_monte_carlo;

/// Standard result type for all engine operations
pub type EngineResult<T> = Result<T, EngineError>;
