use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn};

use crate::cash_flow::{BaseMetrics, CashFlowModel};
use crate::input::CalculationInput;
use crate::monte_carlo::{MonteCarloSimulator, MonteCarloSummary};
use crate::reference::{CountryProfile, Persona};
use crate::scenarios::scenario::evaluate_scenarios;
use crate::scenarios::sensitivity::evaluate_sensitivity;
use crate::scenarios::{ScenarioAnalysis, SensitivityAnalysis};
use crate::scoring::{
    recommend, score_opportunity, score_risk, OpportunityComponents, RecommendationTier, RiskComponents,
};
use crate::types::{with_metadata, ComputationOutput, Score};
use crate::EngineResult;

use super::config::EngineConfig;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything computed for one persona and country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub persona_id: String,
    pub country_id: String,
    #[serde(flatten)]
    pub base: BaseMetrics,
    pub monte_carlo: MonteCarloSummary,
    pub sensitivity: SensitivityAnalysis,
    pub scenarios: ScenarioAnalysis,
    pub risk_score: Score,
    pub opportunity_score: Score,
    pub risk_components: RiskComponents,
    pub opportunity_components: OpportunityComponents,
    pub recommendation: RecommendationTier,
    pub rationale: String,
}

impl CalculationResult {
    /// Zeroed result returned when the base projection cannot be produced.
    pub fn fallback(persona: &Persona, country: &CountryProfile, input: &CalculationInput) -> Self {
        let tier = RecommendationTier::Avoid;
        CalculationResult {
            persona_id: persona.id.clone(),
            country_id: country.id.clone(),
            base: BaseMetrics::fallback(country.setup_cost, input.sanitized().time_horizon_months),
            monte_carlo: MonteCarloSummary::default(),
            sensitivity: SensitivityAnalysis::default(),
            scenarios: ScenarioAnalysis::default(),
            risk_score: 0.0,
            opportunity_score: 0.0,
            risk_components: RiskComponents::default(),
            opportunity_components: OpportunityComponents::default(),
            recommendation: tier,
            rationale: tier.rationale().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless relocation ROI engine. Instances share nothing, so any number
/// may run side by side.
#[derive(Debug, Clone, Default)]
pub struct RoiEngine {
    pub config: EngineConfig,
}

impl RoiEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(RoiEngine { config })
    }

    pub fn model(&self) -> CashFlowModel {
        CashFlowModel::new(self.config.model.clone())
    }

    pub fn simulator(&self) -> MonteCarloSimulator {
        MonteCarloSimulator::new(self.model(), self.config.monte_carlo.clone())
    }

    /// Full analysis. Never fails: sub-step failures degrade to documented
    /// fallbacks.
    pub fn calculate(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
    ) -> CalculationResult {
        self.evaluate(persona, country, input).result
    }

    /// Full analysis wrapped with methodology, assumptions, warnings and timing.
    pub fn evaluate(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
    ) -> ComputationOutput<CalculationResult> {
        self.evaluate_inner(persona, country, input, |sim, sanitized| {
            sim.run(persona, country, sanitized)
        })
    }

    /// As [`RoiEngine::evaluate`], with the Monte Carlo seed drawn from `rng`.
    pub fn evaluate_with_rng<R: Rng>(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
        rng: &mut R,
    ) -> ComputationOutput<CalculationResult> {
        self.evaluate_inner(persona, country, input, |sim, sanitized| {
            sim.run_with_rng(persona, country, sanitized, rng)
        })
    }

    fn evaluate_inner<F>(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
        simulate: F,
    ) -> ComputationOutput<CalculationResult>
    where
        F: FnOnce(&MonteCarloSimulator, &CalculationInput) -> EngineResult<MonteCarloSummary>,
    {
        let start = Instant::now();
        let span = info_span!("evaluate", persona = %persona.id, country = %country.id);
        let _guard = span.enter();

        let sanitized = input.sanitize();
        let mut warnings = sanitized.adjustments.clone();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.assemble(persona, country, &sanitized.input, simulate)
        }));
        let result = match outcome {
            Ok((result, step_warnings)) => {
                warnings.extend(step_warnings);
                result
            }
            Err(_) => {
                error!("Evaluation panicked, returning fallback result");
                warnings.push("Engine failure: returned fallback result".into());
                CalculationResult::fallback(persona, country, &sanitized.input)
            }
        };

        let elapsed = start.elapsed().as_micros() as u64;
        info!(
            elapsed_us = elapsed,
            roi = result.base.roi,
            recommendation = %result.recommendation,
            "Evaluation complete"
        );

        with_metadata(
            "Relocation ROI: seasonal DCF projection with correlated Monte Carlo, \
             sensitivity and scenario analysis",
            &serde_json::json!({
                "model": self.config.model,
                "monte_carlo": {
                    "iterations": self.config.monte_carlo.iterations,
                    "seed": self.config.monte_carlo.seed,
                },
                "input": sanitized.input,
            }),
            warnings,
            elapsed,
            result,
        )
    }

    fn assemble<F>(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
        simulate: F,
    ) -> (CalculationResult, Vec<String>)
    where
        F: FnOnce(&MonteCarloSimulator, &CalculationInput) -> EngineResult<MonteCarloSummary>,
    {
        let mut warnings: Vec<String> = Vec::new();
        let model = self.model();

        // ---- Base case ----
        let base = match model.compute_base_metrics(persona, country, input) {
            Ok(base) => base,
            Err(e) => {
                warn!(error = %e, "Base projection failed, returning fallback result");
                warnings.push(format!("Base projection failed ({e}); returned fallback result"));
                return (CalculationResult::fallback(persona, country, input), warnings);
            }
        };

        // ---- Distribution ----
        let simulator = self.simulator();
        if simulator.config.is_undersampled() {
            warnings.push(format!(
                "Monte Carlo ran only {} iterations; percentiles are coarse",
                simulator.config.iterations
            ));
        }
        let monte_carlo = simulate(&simulator, input).unwrap_or_else(|e| {
            warn!(error = %e, "Monte Carlo failed, using zeroed summary");
            warnings.push(format!("Monte Carlo failed ({e}); summary zeroed"));
            MonteCarloSummary::default()
        });

        // ---- Sensitivity ----
        let sensitivity = evaluate_sensitivity(input, base.roi, |candidate| {
            model
                .compute_base_metrics(persona, country, candidate)
                .map(|m| m.roi)
        });
        let substituted = sensitivity.substituted_points();
        if substituted > 0 {
            warnings.push(format!(
                "{substituted} sensitivity point(s) failed and use the base ROI"
            ));
        }

        // ---- Scenarios ----
        let scenarios = evaluate_scenarios(input, |candidate| {
            model.compute_base_metrics(persona, country, candidate)
        })
        .unwrap_or_else(|e| {
            warn!(error = %e, "Scenario analysis failed, leaving it empty");
            warnings.push(format!("Scenario analysis failed ({e}); scenarios omitted"));
            ScenarioAnalysis::default()
        });

        // ---- Scoring ----
        let risk = score_risk(persona, country, base.payback_years, monte_carlo.std_roi);
        let opportunity = score_opportunity(persona, country, base.roi);
        let recommendation = recommend(base.roi, risk.score);

        let result = CalculationResult {
            persona_id: persona.id.clone(),
            country_id: country.id.clone(),
            base,
            monte_carlo,
            sensitivity,
            scenarios,
            risk_score: risk.score,
            opportunity_score: opportunity.score,
            risk_components: risk.components,
            opportunity_components: opportunity.components,
            recommendation,
            rationale: recommendation.rationale().to_string(),
        };
        (result, warnings)
    }
}

/// Analyse one persona and country with the default engine.
pub fn calculate_comprehensive_roi(
    persona: &Persona,
    country: &CountryProfile,
    input: &CalculationInput,
) -> CalculationResult {
    RoiEngine::default().calculate(persona, country, input)
}
