use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::Percent;
use crate::EngineResult;

/// Minimum number of trials accepted by the simulator.
pub const MIN_ITERATIONS: u32 = 1;

/// Below this many trials the tail percentiles are too coarse to trust;
/// runs still proceed but carry a warning.
pub const RECOMMENDED_ITERATIONS: u32 = 100;

fn default_iterations() -> u32 {
    2_000
}

fn default_confidence_levels() -> Vec<Percent> {
    vec![5.0, 10.0, 25.0, 50.0, 75.0, 90.0, 95.0]
}

fn default_histogram_bins() -> usize {
    20
}

/// Distribution parameters of the per-trial shocks.
///
/// revenue factor = N(1, revenue_sigma) + market_to_revenue * market shock;
/// margin factor = N(1, margin_sigma) - revenue_to_margin * revenue factor;
/// success factor = success_scale * Beta(success_alpha, success_beta);
/// cost inflation = max(cost_floor, N(1, cost_sigma)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockParameters {
    pub market_sigma: f64,
    pub revenue_sigma: f64,
    pub market_to_revenue: f64,
    pub margin_sigma: f64,
    pub revenue_to_margin: f64,
    pub success_alpha: f64,
    pub success_beta: f64,
    pub success_scale: f64,
    pub cost_sigma: f64,
    pub cost_floor: f64,
    /// Lowest multiplier applied to revenue
    pub revenue_floor: f64,
    /// Lowest multiplier applied to margin
    pub margin_floor: f64,
    /// Lowest multiplier applied to success probability
    pub success_floor: f64,
}

impl Default for ShockParameters {
    fn default() -> Self {
        ShockParameters {
            market_sigma: 0.2,
            revenue_sigma: 0.18,
            market_to_revenue: 0.3,
            margin_sigma: 0.12,
            revenue_to_margin: 0.1,
            success_alpha: 8.0,
            success_beta: 2.0,
            success_scale: 1.2,
            cost_sigma: 0.15,
            cost_floor: 0.8,
            revenue_floor: 0.3,
            margin_floor: 0.5,
            success_floor: 0.1,
        }
    }
}

impl ShockParameters {
    pub fn validate(&self) -> EngineResult<()> {
        let positive = [
            ("market_sigma", self.market_sigma),
            ("revenue_sigma", self.revenue_sigma),
            ("margin_sigma", self.margin_sigma),
            ("cost_sigma", self.cost_sigma),
            ("success_alpha", self.success_alpha),
            ("success_beta", self.success_beta),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidInput {
                    field: format!("shocks.{field}"),
                    reason: "Must be a positive number".into(),
                });
            }
        }
        let non_negative = [
            ("market_to_revenue", self.market_to_revenue),
            ("revenue_to_margin", self.revenue_to_margin),
            ("success_scale", self.success_scale),
            ("cost_floor", self.cost_floor),
            ("revenue_floor", self.revenue_floor),
            ("margin_floor", self.margin_floor),
            ("success_floor", self.success_floor),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInput {
                    field: format!("shocks.{field}"),
                    reason: "Must be a non-negative number".into(),
                });
            }
        }
        Ok(())
    }
}

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of trials (minimum 100).
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Optional seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Percentiles reported for ROI and NPV.
    #[serde(default = "default_confidence_levels")]
    pub confidence_levels: Vec<Percent>,
    /// Bins in the ROI histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default)]
    pub shocks: ShockParameters,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            iterations: default_iterations(),
            seed: None,
            confidence_levels: default_confidence_levels(),
            histogram_bins: default_histogram_bins(),
            shocks: ShockParameters::default(),
        }
    }
}

impl MonteCarloConfig {
    pub fn seeded(seed: u64) -> Self {
        MonteCarloConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn is_undersampled(&self) -> bool {
        self.iterations < RECOMMENDED_ITERATIONS
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(EngineError::InvalidInput {
                field: "monte_carlo.iterations".into(),
                reason: format!("Must be at least {MIN_ITERATIONS}"),
            });
        }
        if self
            .confidence_levels
            .iter()
            .any(|p| !(0.0..=100.0).contains(p))
        {
            return Err(EngineError::InvalidInput {
                field: "monte_carlo.confidence_levels".into(),
                reason: "Percentiles must be between 0 and 100".into(),
            });
        }
        if self.histogram_bins == 0 {
            return Err(EngineError::InvalidInput {
                field: "monte_carlo.histogram_bins".into(),
                reason: "Must be at least 1".into(),
            });
        }
        self.shocks.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = MonteCarloConfig::default();
        assert_eq!(c.iterations, 2_000);
        assert_eq!(c.confidence_levels.len(), 7);
        c.validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let c: MonteCarloConfig =
            serde_json::from_str(r#"{"iterations": 500, "shocks": {"market_sigma": 0.3}}"#).unwrap();
        assert_eq!(c.iterations, 500);
        assert_eq!(c.seed, None);
        assert_eq!(c.shocks.market_sigma, 0.3);
        assert_eq!(c.shocks.success_alpha, 8.0);
        assert_eq!(c.histogram_bins, 20);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let c = MonteCarloConfig {
            iterations: 0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_small_runs_accepted() {
        let c = MonteCarloConfig {
            iterations: 1,
            ..Default::default()
        };
        c.validate().unwrap();
        assert!(c.is_undersampled());
        assert!(!MonteCarloConfig::default().is_undersampled());
    }

    #[test]
    fn test_zero_sigma_rejected() {
        let c = MonteCarloConfig {
            shocks: ShockParameters {
                revenue_sigma: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_percentile_out_of_range_rejected() {
        let c = MonteCarloConfig {
            confidence_levels: vec![5.0, 101.0],
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}
