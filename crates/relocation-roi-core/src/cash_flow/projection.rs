use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::input::CalculationInput;
use crate::reference::{CountryProfile, Persona};
use crate::time_value;
use crate::types::{Money, Percent, Rate};
use crate::EngineResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Policy constants of the projection. These are engine settings, not
/// per-request inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelAssumptions {
    /// Compound growth applied to the monthly delta (0.02 = 2% per month)
    pub monthly_growth_rate: Rate,
    /// Upper bound on the projected margin, in percent
    pub margin_cap: Percent,
}

impl Default for ModelAssumptions {
    fn default() -> Self {
        ModelAssumptions {
            monthly_growth_rate: 0.02,
            margin_cap: 95.0,
        }
    }
}

impl ModelAssumptions {
    pub fn validate(&self) -> EngineResult<()> {
        if !self.monthly_growth_rate.is_finite() || self.monthly_growth_rate <= -1.0 {
            return Err(EngineError::InvalidInput {
                field: "model.monthly_growth_rate".into(),
                reason: "Growth rate must be greater than -100%".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.margin_cap) {
            return Err(EngineError::InvalidInput {
                field: "model.margin_cap".into(),
                reason: "Margin cap must be between 0 and 100".into(),
            });
        }
        Ok(())
    }
}

/// The parts of a country profile the projection reads. Monte Carlo trials
/// perturb a copy of these instead of cloning the whole profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestinationTerms {
    pub corp_tax: Rate,
    pub pers_tax: Rate,
    pub living_cost: Money,
    pub business_cost: Money,
    pub setup_cost: Money,
    pub seasonality: [f64; 12],
}

impl From<&CountryProfile> for DestinationTerms {
    fn from(country: &CountryProfile) -> Self {
        DestinationTerms {
            corp_tax: country.corp_tax,
            pers_tax: country.pers_tax,
            living_cost: country.living_cost,
            business_cost: country.business_cost,
            setup_cost: country.setup_cost,
            seasonality: country.seasonality,
        }
    }
}

impl DestinationTerms {
    /// Seasonality multiplier for a 1-based projection month, cycling yearly.
    pub fn seasonal_factor(&self, month: u32) -> f64 {
        self.seasonality[(month.saturating_sub(1) % 12) as usize]
    }
}

/// Deterministic metrics of one projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseMetrics {
    pub npv: Money,
    /// Sum of monthly flows as a percentage of setup cost
    pub roi: Percent,
    pub irr_annual: Percent,
    pub mirr_annual: Percent,
    /// First month the cumulative flow is non-negative; `None` if never
    pub payback_months: Option<u32>,
    pub payback_years: Option<f64>,
    pub monthly_delta: Money,
    pub total_return: Money,
    pub monthly_flows: Vec<Money>,
    pub setup_cost: Money,
    pub profitability_index: f64,
    pub current_net_income: Money,
    pub projected_net_income: Money,
    pub projected_revenue: Money,
    pub projected_margin: Percent,
}

impl BaseMetrics {
    /// Zeroed metrics returned when a projection cannot be produced.
    pub fn fallback(setup_cost: Money, time_horizon_months: u32) -> Self {
        BaseMetrics {
            npv: 0.0,
            roi: 0.0,
            irr_annual: 0.0,
            mirr_annual: 0.0,
            payback_months: None,
            payback_years: None,
            monthly_delta: 0.0,
            total_return: 0.0,
            monthly_flows: vec![0.0; time_horizon_months as usize],
            setup_cost,
            profitability_index: 1.0,
            current_net_income: 0.0,
            projected_net_income: 0.0,
            projected_revenue: 0.0,
            projected_margin: 0.0,
        }
    }
}

/// After-tax monthly net income: profit taxed at corporate then personal
/// level, less living and business costs.
fn net_income(
    revenue: Money,
    margin_pct: Percent,
    corp_tax: Rate,
    pers_tax: Rate,
    living: Money,
    business: Money,
) -> Money {
    let profit = revenue * margin_pct / 100.0;
    profit * (1.0 - corp_tax) * (1.0 - pers_tax) - living - business
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// Stateless projection service holding only its assumptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowModel {
    pub assumptions: ModelAssumptions,
}

impl CashFlowModel {
    pub fn new(assumptions: ModelAssumptions) -> Self {
        CashFlowModel { assumptions }
    }

    /// Project relocating `persona` to `country` under `input`.
    pub fn compute_base_metrics(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
    ) -> EngineResult<BaseMetrics> {
        self.project(persona.success_multiplier, &DestinationTerms::from(country), input)
    }

    /// Core projection over pre-extracted destination terms.
    pub fn project(
        &self,
        success_multiplier: f64,
        terms: &DestinationTerms,
        input: &CalculationInput,
    ) -> EngineResult<BaseMetrics> {
        input.validate()?;
        // Perturbed trials may carry success above 100%; only the floor holds here.
        let success_probability = input.success_probability.max(0.0);
        let mut input = input.sanitized();
        input.success_probability = success_probability;

        // Current situation
        let current_net_income = net_income(
            input.current_revenue,
            input.current_margin,
            input.current_corp_tax / 100.0,
            input.current_pers_tax / 100.0,
            input.current_living,
            input.current_business,
        );

        // Projected situation under destination taxes and costs
        let projected_revenue = input.current_revenue * input.revenue_multiplier * success_multiplier;
        let projected_margin =
            (input.current_margin + input.margin_improvement).min(self.assumptions.margin_cap);
        let projected_net_income = net_income(
            projected_revenue,
            projected_margin,
            terms.corp_tax,
            terms.pers_tax,
            terms.living_cost,
            terms.business_cost,
        );

        let monthly_delta =
            (projected_net_income - current_net_income) * (input.success_probability / 100.0);
        let setup_cost = terms.setup_cost;

        // Seasonal, compounding monthly flows
        let growth = 1.0 + self.assumptions.monthly_growth_rate;
        let monthly_flows: Vec<Money> = (1..=input.time_horizon_months)
            .map(|month| {
                monthly_delta * terms.seasonal_factor(month) * growth.powi(month as i32 - 1)
            })
            .collect();

        let payback_months = time_value::payback_month(setup_cost, &monthly_flows);
        let npv = time_value::npv(
            time_value::monthly_rate(input.discount_rate),
            setup_cost,
            &monthly_flows,
        )?;

        let irr_annual = time_value::irr(setup_cost, &monthly_flows).unwrap_or_else(|e| {
            debug!(error = %e, "IRR unavailable, reporting 0");
            0.0
        }) * 100.0;
        let mirr_annual = time_value::mirr(setup_cost, &monthly_flows, input.discount_rate / 100.0)
            .unwrap_or_else(|e| {
                debug!(error = %e, "MIRR unavailable, reporting 0");
                0.0
            })
            * 100.0;

        let total_return: Money = monthly_flows.iter().sum();
        let (roi, profitability_index) = if setup_cost > 0.0 {
            (total_return / setup_cost * 100.0, (npv + setup_cost) / setup_cost)
        } else {
            (0.0, 1.0)
        };

        if !(npv.is_finite() && roi.is_finite()) {
            return Err(EngineError::FinancialImpossibility(format!(
                "Projection produced non-finite results (npv={npv}, roi={roi})"
            )));
        }

        Ok(BaseMetrics {
            npv,
            roi,
            irr_annual,
            mirr_annual,
            payback_months,
            payback_years: payback_months.map(|m| m as f64 / 12.0),
            monthly_delta,
            total_return,
            monthly_flows,
            setup_cost,
            profitability_index,
            current_net_income,
            projected_net_income,
            projected_revenue,
            projected_margin,
        })
    }
}

/// [`CashFlowModel::compute_base_metrics`] with default assumptions.
pub fn compute_base_metrics(
    persona: &Persona,
    country: &CountryProfile,
    input: &CalculationInput,
) -> EngineResult<BaseMetrics> {
    CashFlowModel::default().compute_base_metrics(persona, country, input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Catalog;
    use approx::assert_relative_eq;

    fn fixtures() -> (Persona, CountryProfile) {
        let catalog = Catalog::builtin();
        (
            catalog.persona("tech_startup").unwrap().clone(),
            catalog.country("UAE").unwrap().clone(),
        )
    }

    fn flat_country(setup_cost: Money) -> CountryProfile {
        let (_, mut c) = fixtures();
        c.seasonality = [1.0; 12];
        c.setup_cost = setup_cost;
        c
    }

    #[test]
    fn test_current_net_income() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            current_revenue: 10_000.0,
            current_margin: 50.0,
            current_corp_tax: 20.0,
            current_pers_tax: 50.0,
            current_living: 500.0,
            current_business: 300.0,
            ..Default::default()
        };
        let m = compute_base_metrics(&persona, &country, &input).unwrap();
        // 10000 * 0.5 * 0.8 * 0.5 - 800 = 1200
        assert_relative_eq!(m.current_net_income, 1_200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_projected_net_income_uses_destination_rates() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            current_revenue: 10_000.0,
            current_margin: 30.0,
            revenue_multiplier: 1.0,
            margin_improvement: 0.0,
            ..Default::default()
        };
        let m = compute_base_metrics(&persona, &country, &input).unwrap();
        let revenue = 10_000.0 * 1.6;
        let expected = revenue * 0.30 * (1.0 - 0.09) * 1.0 - 9_200.0 - 2_200.0;
        assert_relative_eq!(m.projected_revenue, revenue, epsilon = 1e-9);
        assert_relative_eq!(m.projected_net_income, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_margin_capped_at_95() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            current_revenue: 10_000.0,
            current_margin: 90.0,
            margin_improvement: 50.0,
            revenue_multiplier: 1.0,
            ..Default::default()
        };
        let m = compute_base_metrics(&persona, &country, &input).unwrap();
        assert_eq!(m.projected_margin, 95.0);
        let expected = 16_000.0 * 0.95 * 0.91 - 9_200.0 - 2_200.0;
        assert_relative_eq!(m.projected_net_income, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_monthly_delta_scales_linearly_with_success_probability() {
        let (persona, country) = fixtures();
        let full = CalculationInput {
            success_probability: 100.0,
            ..Default::default()
        };
        let half = CalculationInput {
            success_probability: 50.0,
            ..Default::default()
        };
        let a = compute_base_metrics(&persona, &country, &full).unwrap();
        let b = compute_base_metrics(&persona, &country, &half).unwrap();
        assert_relative_eq!(b.monthly_delta * 2.0, a.monthly_delta, max_relative = 1e-12);
    }

    #[test]
    fn test_success_above_100_is_not_capped() {
        let (persona, country) = fixtures();
        let terms = DestinationTerms::from(&country);
        let model = CashFlowModel::default();
        let base = CalculationInput {
            success_probability: 100.0,
            ..Default::default()
        };
        let boosted = CalculationInput {
            success_probability: 120.0,
            ..base.clone()
        };
        let a = model.project(persona.success_multiplier, &terms, &base).unwrap();
        let b = model.project(persona.success_multiplier, &terms, &boosted).unwrap();
        assert_relative_eq!(b.monthly_delta, a.monthly_delta * 1.2, max_relative = 1e-12);
    }

    #[test]
    fn test_negative_success_floors_at_zero() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            success_probability: -10.0,
            ..Default::default()
        };
        let m = compute_base_metrics(&persona, &country, &input).unwrap();
        assert_eq!(m.monthly_delta, 0.0);
    }

    #[test]
    fn test_seasonal_factor_cycles_yearly() {
        let (_, country) = fixtures();
        let terms = DestinationTerms::from(&country);
        assert_eq!(terms.seasonal_factor(1), country.seasonality[0]);
        assert_eq!(terms.seasonal_factor(12), country.seasonality[11]);
        assert_eq!(terms.seasonal_factor(13), country.seasonality[0]);
        assert_eq!(terms.seasonal_factor(25), country.seasonality[0]);
    }

    #[test]
    fn test_flows_apply_seasonality_and_growth() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            time_horizon_months: 14,
            ..Default::default()
        };
        let m = compute_base_metrics(&persona, &country, &input).unwrap();
        assert_eq!(m.monthly_flows.len(), 14);
        assert_relative_eq!(m.monthly_flows[0], m.monthly_delta * 1.2, max_relative = 1e-12);
        assert_relative_eq!(
            m.monthly_flows[12],
            m.monthly_delta * 1.2 * 1.02_f64.powi(12),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_roi_matches_total_return_over_setup() {
        let (persona, country) = fixtures();
        let m = compute_base_metrics(&persona, &country, &CalculationInput::default()).unwrap();
        assert_relative_eq!(m.roi, 100.0 * m.total_return / m.setup_cost, max_relative = 1e-12);
        assert_relative_eq!(
            m.profitability_index,
            (m.npv + m.setup_cost) / m.setup_cost,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_zero_setup_cost_gives_zero_roi() {
        let (persona, _) = fixtures();
        let country = flat_country(0.0);
        let m = compute_base_metrics(&persona, &country, &CalculationInput::default()).unwrap();
        assert_eq!(m.roi, 0.0);
        assert_eq!(m.profitability_index, 1.0);
        assert!(m.total_return > 0.0);
    }

    #[test]
    fn test_payback_years_is_months_over_twelve() {
        let (persona, country) = fixtures();
        let m = compute_base_metrics(&persona, &country, &CalculationInput::default()).unwrap();
        let months = m.payback_months.unwrap();
        assert_eq!(m.payback_years, Some(months as f64 / 12.0));
    }

    #[test]
    fn test_no_payback_when_relocation_loses_money() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            current_revenue: 200_000.0,
            current_margin: 60.0,
            current_corp_tax: 0.0,
            current_pers_tax: 0.0,
            revenue_multiplier: 0.1,
            ..Default::default()
        };
        let m = compute_base_metrics(&persona, &country, &input).unwrap();
        assert!(m.monthly_delta < 0.0);
        assert_eq!(m.payback_months, None);
        assert_eq!(m.payback_years, None);
        assert_eq!(m.irr_annual, 0.0);
    }

    #[test]
    fn test_deterministic_metrics_are_identical() {
        let (persona, country) = fixtures();
        let input = CalculationInput::for_persona(&persona);
        let a = compute_base_metrics(&persona, &country, &input).unwrap();
        let b = compute_base_metrics(&persona, &country, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            discount_rate: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            compute_base_metrics(&persona, &country, &input),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_custom_growth_assumption() {
        let (persona, _) = fixtures();
        let country = flat_country(10_000.0);
        let model = CashFlowModel::new(ModelAssumptions {
            monthly_growth_rate: 0.0,
            ..Default::default()
        });
        let m = model
            .compute_base_metrics(&persona, &country, &CalculationInput::default())
            .unwrap();
        assert!(m.monthly_flows.iter().all(|f| (f - m.monthly_delta).abs() < 1e-9));
    }

    #[test]
    fn test_fallback_shape() {
        let m = BaseMetrics::fallback(48_000.0, 36);
        assert_eq!(m.monthly_flows.len(), 36);
        assert_eq!(m.setup_cost, 48_000.0);
        assert_eq!(m.profitability_index, 1.0);
        assert_eq!(m.payback_months, None);
    }
}
