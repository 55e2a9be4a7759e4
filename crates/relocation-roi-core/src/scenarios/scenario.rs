use serde::{Deserialize, Serialize};

use crate::cash_flow::{BaseMetrics, CashFlowModel};
use crate::input::CalculationInput;
use crate::reference::{CountryProfile, Persona};
use crate::types::Percent;
use crate::EngineResult;

/// Named macro scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Pessimistic,
    Realistic,
    Optimistic,
}

/// Multiplicative adjustment applied to the growth inputs of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAdjustment {
    pub revenue_multiplier: f64,
    pub margin_improvement: f64,
    pub success_probability: f64,
    /// Ceiling on the adjusted success probability
    pub success_cap: Option<Percent>,
}

impl ScenarioAdjustment {
    pub const PESSIMISTIC: ScenarioAdjustment = ScenarioAdjustment {
        revenue_multiplier: 0.7,
        margin_improvement: 0.8,
        success_probability: 0.6,
        success_cap: None,
    };

    pub const REALISTIC: ScenarioAdjustment = ScenarioAdjustment {
        revenue_multiplier: 1.0,
        margin_improvement: 1.0,
        success_probability: 1.0,
        success_cap: None,
    };

    pub const OPTIMISTIC: ScenarioAdjustment = ScenarioAdjustment {
        revenue_multiplier: 1.3,
        margin_improvement: 1.2,
        success_probability: 1.1,
        success_cap: Some(95.0),
    };

    pub fn apply(&self, base: &CalculationInput) -> CalculationInput {
        let mut input = base.clone();
        input.revenue_multiplier *= self.revenue_multiplier;
        input.margin_improvement *= self.margin_improvement;
        input.success_probability *= self.success_probability;
        if let Some(cap) = self.success_cap {
            input.success_probability = input.success_probability.min(cap);
        }
        input
    }
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::Pessimistic,
        ScenarioKind::Realistic,
        ScenarioKind::Optimistic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Pessimistic => "pessimistic",
            ScenarioKind::Realistic => "realistic",
            ScenarioKind::Optimistic => "optimistic",
        }
    }

    pub fn adjustment(&self) -> ScenarioAdjustment {
        match self {
            ScenarioKind::Pessimistic => ScenarioAdjustment::PESSIMISTIC,
            ScenarioKind::Realistic => ScenarioAdjustment::REALISTIC,
            ScenarioKind::Optimistic => ScenarioAdjustment::OPTIMISTIC,
        }
    }
}

/// Result for a single scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub kind: ScenarioKind,
    pub metrics: BaseMetrics,
    /// ROI minus the realistic ROI, in percentage points
    pub roi_deviation: Percent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub scenarios: Vec<ScenarioOutcome>,
}

impl ScenarioAnalysis {
    pub fn get(&self, kind: ScenarioKind) -> Option<&ScenarioOutcome> {
        self.scenarios.iter().find(|s| s.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Evaluate the three scenarios through `eval_fn`. Unlike a sensitivity
/// sweep, any scenario failure fails the whole analysis.
pub fn evaluate_scenarios<F>(base: &CalculationInput, eval_fn: F) -> EngineResult<ScenarioAnalysis>
where
    F: Fn(&CalculationInput) -> EngineResult<BaseMetrics>,
{
    let evaluated = ScenarioKind::ALL
        .iter()
        .map(|&kind| Ok((kind, eval_fn(&kind.adjustment().apply(base))?)))
        .collect::<EngineResult<Vec<(ScenarioKind, BaseMetrics)>>>()?;

    let realistic_roi = evaluated
        .iter()
        .find(|(kind, _)| *kind == ScenarioKind::Realistic)
        .map(|(_, m)| m.roi)
        .unwrap_or_default();

    let scenarios = evaluated
        .into_iter()
        .map(|(kind, metrics)| ScenarioOutcome {
            kind,
            roi_deviation: metrics.roi - realistic_roi,
            metrics,
        })
        .collect();

    Ok(ScenarioAnalysis { scenarios })
}

/// Pessimistic, realistic and optimistic projections for one persona and country.
pub fn run_scenarios(
    model: &CashFlowModel,
    persona: &Persona,
    country: &CountryProfile,
    input: &CalculationInput,
) -> EngineResult<ScenarioAnalysis> {
    evaluate_scenarios(&input.sanitized(), |candidate| {
        model.compute_base_metrics(persona, country, candidate)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::reference::Catalog;

    fn fixtures() -> (Persona, CountryProfile) {
        let catalog = Catalog::builtin();
        (
            catalog.persona("tech_startup").unwrap().clone(),
            catalog.country("UAE").unwrap().clone(),
        )
    }

    #[test]
    fn test_adjustments() {
        let base = CalculationInput::default();
        let p = ScenarioAdjustment::PESSIMISTIC.apply(&base);
        assert_eq!(p.revenue_multiplier, base.revenue_multiplier * 0.7);
        assert_eq!(p.margin_improvement, base.margin_improvement * 0.8);
        assert_eq!(p.success_probability, base.success_probability * 0.6);

        assert_eq!(ScenarioAdjustment::REALISTIC.apply(&base), base);
    }

    #[test]
    fn test_optimistic_success_capped() {
        let base = CalculationInput {
            success_probability: 90.0,
            ..Default::default()
        };
        let o = ScenarioAdjustment::OPTIMISTIC.apply(&base);
        assert_eq!(o.success_probability, 95.0);
    }

    #[test]
    fn test_scenario_ordering() {
        let (persona, country) = fixtures();
        let analysis = run_scenarios(
            &CashFlowModel::default(),
            &persona,
            &country,
            &CalculationInput::for_persona(&persona),
        )
        .unwrap();

        let p = analysis.get(ScenarioKind::Pessimistic).unwrap();
        let r = analysis.get(ScenarioKind::Realistic).unwrap();
        let o = analysis.get(ScenarioKind::Optimistic).unwrap();
        assert!(p.metrics.roi <= r.metrics.roi);
        assert!(r.metrics.roi <= o.metrics.roi);
        assert_eq!(r.roi_deviation, 0.0);
        assert!(p.roi_deviation <= 0.0 && o.roi_deviation >= 0.0);
    }

    #[test]
    fn test_realistic_matches_base_case() {
        let (persona, country) = fixtures();
        let model = CashFlowModel::default();
        let input = CalculationInput::for_persona(&persona);
        let analysis = run_scenarios(&model, &persona, &country, &input).unwrap();
        let base = model.compute_base_metrics(&persona, &country, &input).unwrap();
        assert_eq!(analysis.get(ScenarioKind::Realistic).unwrap().metrics, base);
    }

    #[test]
    fn test_failure_propagates() {
        let result = evaluate_scenarios(&CalculationInput::default(), |_| {
            Err(EngineError::InsufficientData("no data".into()))
        });
        assert!(result.is_err());
    }
}
