//! Correlated factor draws for a single Monte Carlo trial.

use rand::Rng;
use statrs::distribution::{Beta, Normal};

use crate::cash_flow::DestinationTerms;
use crate::error::EngineError;
use crate::input::CalculationInput;
use crate::EngineResult;

use super::config::ShockParameters;

/// Raw multiplicative factors drawn for one trial, before floors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialFactors {
    pub market_shock: f64,
    pub revenue: f64,
    pub margin: f64,
    pub success: f64,
    pub cost_inflation: f64,
}

impl TrialFactors {
    /// Apply the factors to copies of the input and destination terms.
    pub fn apply(
        &self,
        params: &ShockParameters,
        input: &CalculationInput,
        terms: &DestinationTerms,
    ) -> (CalculationInput, DestinationTerms) {
        let mut input = input.clone();
        input.current_revenue *= self.revenue.max(params.revenue_floor);
        input.current_margin *= self.margin.max(params.margin_floor);
        input.success_probability *= self.success.max(params.success_floor);

        let mut terms = *terms;
        terms.living_cost *= self.cost_inflation;

        (input, terms)
    }
}

/// Pre-built distributions for the five factors.
#[derive(Debug, Clone)]
pub struct FactorSampler {
    params: ShockParameters,
    market: Normal,
    revenue: Normal,
    margin: Normal,
    success: Beta,
    cost: Normal,
}

fn invalid(field: &str, e: impl std::fmt::Display) -> EngineError {
    EngineError::InvalidInput {
        field: format!("shocks.{field}"),
        reason: format!("Invalid distribution parameters: {e}"),
    }
}

impl FactorSampler {
    pub fn new(params: &ShockParameters) -> EngineResult<Self> {
        params.validate()?;
        Ok(FactorSampler {
            params: params.clone(),
            market: Normal::new(0.0, params.market_sigma).map_err(|e| invalid("market_sigma", e))?,
            revenue: Normal::new(1.0, params.revenue_sigma)
                .map_err(|e| invalid("revenue_sigma", e))?,
            margin: Normal::new(1.0, params.margin_sigma).map_err(|e| invalid("margin_sigma", e))?,
            success: Beta::new(params.success_alpha, params.success_beta)
                .map_err(|e| invalid("success_alpha", e))?,
            cost: Normal::new(1.0, params.cost_sigma).map_err(|e| invalid("cost_sigma", e))?,
        })
    }

    pub fn params(&self) -> &ShockParameters {
        &self.params
    }

    /// Draw one set of factors. The draw order is fixed so a seeded RNG
    /// always yields the same trial.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> TrialFactors {
        let market_shock = rng.sample(&self.market);
        let revenue = rng.sample(&self.revenue) + market_shock * self.params.market_to_revenue;
        // Margins compress when revenue surges
        let margin = rng.sample(&self.margin) - revenue * self.params.revenue_to_margin;
        let success = rng.sample(&self.success) * self.params.success_scale;
        let cost_inflation = rng.sample(&self.cost).max(self.params.cost_floor);

        TrialFactors {
            market_shock,
            revenue,
            margin,
            success,
            cost_inflation,
        }
    }
}
