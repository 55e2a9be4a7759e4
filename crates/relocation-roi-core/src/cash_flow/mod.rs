//! Deterministic monthly cash-flow projection of a relocation.

pub mod projection;

pub use projection::{compute_base_metrics, BaseMetrics, CashFlowModel, DestinationTerms, ModelAssumptions};
