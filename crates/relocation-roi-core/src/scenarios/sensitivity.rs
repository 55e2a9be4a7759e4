use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cash_flow::CashFlowModel;
use crate::input::CalculationInput;
use crate::reference::{CountryProfile, Persona};
use crate::types::Percent;
use crate::EngineResult;

/// Input the one-at-a-time sweep perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityVariable {
    Revenue,
    Margin,
    RevenueMultiplier,
    MarginImprovement,
    SuccessProbability,
}

/// How a test value is applied to the base input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// base × test value
    Scale,
    /// test value replaces base
    Replace,
}

impl SensitivityVariable {
    pub const ALL: [SensitivityVariable; 5] = [
        SensitivityVariable::Revenue,
        SensitivityVariable::Margin,
        SensitivityVariable::RevenueMultiplier,
        SensitivityVariable::MarginImprovement,
        SensitivityVariable::SuccessProbability,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SensitivityVariable::Revenue => "revenue",
            SensitivityVariable::Margin => "margin",
            SensitivityVariable::RevenueMultiplier => "revenue_multiplier",
            SensitivityVariable::MarginImprovement => "margin_improvement",
            SensitivityVariable::SuccessProbability => "success_probability",
        }
    }

    pub fn mode(&self) -> SweepMode {
        match self {
            SensitivityVariable::Revenue | SensitivityVariable::RevenueMultiplier => SweepMode::Scale,
            SensitivityVariable::Margin
            | SensitivityVariable::MarginImprovement
            | SensitivityVariable::SuccessProbability => SweepMode::Replace,
        }
    }

    /// Sweep points. Margin values replace the current margin outright, so
    /// the negative ones land on the 1% margin floor once sanitized.
    pub fn test_values(&self) -> &'static [f64] {
        match self {
            SensitivityVariable::Revenue => &[0.8, 0.9, 1.1, 1.2, 1.3],
            SensitivityVariable::Margin => &[-5.0, -2.0, 2.0, 5.0, 8.0],
            SensitivityVariable::RevenueMultiplier => &[0.8, 1.0, 1.5, 2.0, 2.5],
            SensitivityVariable::MarginImprovement => &[-5.0, 0.0, 5.0, 10.0, 15.0],
            SensitivityVariable::SuccessProbability => &[50.0, 65.0, 80.0, 90.0, 95.0],
        }
    }

    fn field<'a>(&self, input: &'a mut CalculationInput) -> &'a mut f64 {
        match self {
            SensitivityVariable::Revenue => &mut input.current_revenue,
            SensitivityVariable::Margin => &mut input.current_margin,
            SensitivityVariable::RevenueMultiplier => &mut input.revenue_multiplier,
            SensitivityVariable::MarginImprovement => &mut input.margin_improvement,
            SensitivityVariable::SuccessProbability => &mut input.success_probability,
        }
    }

    /// Copy of `base` with this variable set to `test_value`.
    pub fn apply(&self, base: &CalculationInput, test_value: f64) -> CalculationInput {
        let mut input = base.clone();
        let mode = self.mode();
        let field = self.field(&mut input);
        *field = match mode {
            SweepMode::Scale => *field * test_value,
            SweepMode::Replace => test_value,
        };
        input
    }
}

/// ROI at one test value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub test_value: f64,
    pub roi: Percent,
    /// The evaluation failed and the base ROI stands in for it
    pub substituted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySweep {
    pub variable: SensitivityVariable,
    pub mode: SweepMode,
    pub points: Vec<SensitivityPoint>,
    /// max ROI - min ROI across the points
    pub swing: Percent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensitivityAnalysis {
    pub base_roi: Percent,
    pub sweeps: Vec<SensitivitySweep>,
}

impl SensitivityAnalysis {
    pub fn sweep(&self, variable: SensitivityVariable) -> Option<&SensitivitySweep> {
        self.sweeps.iter().find(|s| s.variable == variable)
    }

    /// Sweeps ordered by swing, largest first (tornado order).
    pub fn ranked(&self) -> Vec<&SensitivitySweep> {
        let mut ranked: Vec<&SensitivitySweep> = self.sweeps.iter().collect();
        ranked.sort_by(|a, b| b.swing.partial_cmp(&a.swing).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    pub fn substituted_points(&self) -> usize {
        self.sweeps
            .iter()
            .flat_map(|s| &s.points)
            .filter(|p| p.substituted)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.sweeps.is_empty()
    }
}

/// Sweep every variable through `eval_fn`, which maps an input to its ROI.
///
/// A point whose evaluation fails records `base_roi` instead, so one bad
/// point never aborts the sweep.
pub fn evaluate_sensitivity<F>(base: &CalculationInput, base_roi: Percent, eval_fn: F) -> SensitivityAnalysis
where
    F: Fn(&CalculationInput) -> EngineResult<Percent>,
{
    let sweeps = SensitivityVariable::ALL
        .iter()
        .map(|&variable| {
            let points: Vec<SensitivityPoint> = variable
                .test_values()
                .iter()
                .map(|&test_value| match eval_fn(&variable.apply(base, test_value)) {
                    Ok(roi) => SensitivityPoint {
                        test_value,
                        roi,
                        substituted: false,
                    },
                    Err(e) => {
                        debug!(variable = variable.name(), test_value, error = %e, "Sweep point failed, using base ROI");
                        SensitivityPoint {
                            test_value,
                            roi: base_roi,
                            substituted: true,
                        }
                    }
                })
                .collect();

            let max = points.iter().map(|p| p.roi).fold(f64::NEG_INFINITY, f64::max);
            let min = points.iter().map(|p| p.roi).fold(f64::INFINITY, f64::min);

            SensitivitySweep {
                variable,
                mode: variable.mode(),
                points,
                swing: max - min,
            }
        })
        .collect();

    SensitivityAnalysis { base_roi, sweeps }
}

/// Sensitivity of ROI to each input for one persona and country.
pub fn run_sensitivity_analysis(
    model: &CashFlowModel,
    persona: &Persona,
    country: &CountryProfile,
    input: &CalculationInput,
) -> EngineResult<SensitivityAnalysis> {
    let base = input.sanitized();
    let base_roi = model.compute_base_metrics(persona, country, &base)?.roi;
    Ok(evaluate_sensitivity(&base, base_roi, |candidate| {
        model
            .compute_base_metrics(persona, country, candidate)
            .map(|m| m.roi)
    }))
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
    fn test_apply_modes() {
        let base = CalculationInput::default();
        let scaled = SensitivityVariable::Revenue.apply(&base, 1.2);
        assert_eq!(scaled.current_revenue, base.current_revenue * 1.2);

        let margin = SensitivityVariable::Margin.apply(&base, 8.0);
        assert_eq!(margin.current_margin, 8.0);
        assert_eq!(SensitivityVariable::Margin.mode(), SweepMode::Replace);

        let replaced = SensitivityVariable::SuccessProbability.apply(&base, 90.0);
        assert_eq!(replaced.success_probability, 90.0);
        assert_eq!(replaced.current_revenue, base.current_revenue);
    }

    #[test]
    fn test_full_sweep_shape() {
        let (persona, country) = fixtures();
        let analysis = run_sensitivity_analysis(
            &CashFlowModel::default(),
            &persona,
            &country,
            &CalculationInput::for_persona(&persona),
        )
        .unwrap();

        assert_eq!(analysis.sweeps.len(), 5);
        for sweep in &analysis.sweeps {
            assert_eq!(sweep.points.len(), 5);
            assert!(sweep.swing >= 0.0);
        }
        assert_eq!(analysis.substituted_points(), 0);
    }

    #[test]
    fn test_roi_rises_with_success_probability() {
        let (persona, country) = fixtures();
        let analysis = run_sensitivity_analysis(
            &CashFlowModel::default(),
            &persona,
            &country,
            &CalculationInput::for_persona(&persona),
        )
        .unwrap();
        let sweep = analysis.sweep(SensitivityVariable::SuccessProbability).unwrap();
        for pair in sweep.points.windows(2) {
            assert!(pair[0].roi < pair[1].roi);
        }
    }

    #[test]
    fn test_negative_margins_hit_the_floor() {
        let (persona, country) = fixtures();
        let analysis = run_sensitivity_analysis(
            &CashFlowModel::default(),
            &persona,
            &country,
            &CalculationInput::for_persona(&persona),
        )
        .unwrap();
        let sweep = analysis.sweep(SensitivityVariable::Margin).unwrap();
        assert_eq!(sweep.points[0].test_value, -5.0);
        assert_eq!(sweep.points[0].roi, sweep.points[1].roi);
        assert!(sweep.points[2].roi < sweep.points[4].roi);
    }

    #[test]
    fn test_failed_point_uses_base_roi() {
        let base = CalculationInput::default();
        let analysis = evaluate_sensitivity(&base, 42.0, |candidate| {
            if candidate.success_probability == 80.0 {
                Err(EngineError::DivisionByZero {
                    context: "test evaluator".into(),
                })
            } else {
                Ok(candidate.success_probability)
            }
        });

        let sweep = analysis.sweep(SensitivityVariable::SuccessProbability).unwrap();
        let point = &sweep.points[2];
        assert_eq!(point.test_value, 80.0);
        assert_eq!(point.roi, 42.0);
        assert!(point.substituted);
        assert_eq!(analysis.substituted_points(), 1);
    }

    #[test]
    fn test_ranked_by_swing() {
        let base = CalculationInput::default();
        let analysis = evaluate_sensitivity(&base, 0.0, |candidate| Ok(candidate.current_revenue / 1_000.0));
        let ranked = analysis.ranked();
        assert_eq!(ranked[0].variable, SensitivityVariable::Revenue);
        for pair in ranked.windows(2) {
            assert!(pair[0].swing >= pair[1].swing);
        }
    }
}
