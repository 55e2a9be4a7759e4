use clap::Args;
use serde::Serialize;
use serde_json::json;

use relocation_roi_core::cash_flow::CashFlowModel;
use relocation_roi_core::scenarios::sensitivity::SweepMode;
use relocation_roi_core::scenarios::{run_scenarios, run_sensitivity_analysis};

use super::{CommandResult, Context, RelocationArgs};

/// Arguments for the one-at-a-time sensitivity sweep
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub relocation: RelocationArgs,
}

/// Arguments for the pessimistic / realistic / optimistic scenarios
#[derive(Args)]
pub struct ScenariosArgs {
    #[command(flatten)]
    pub relocation: RelocationArgs,
}

#[derive(Debug, Serialize)]
struct SensitivityRow {
    variable: &'static str,
    mode: SweepMode,
    test_value: f64,
    roi: f64,
    substituted: bool,
}

#[derive(Debug, Serialize)]
struct ScenarioRow {
    scenario: &'static str,
    roi: f64,
    roi_deviation: f64,
    npv: f64,
    irr_annual: f64,
    payback_years: Option<f64>,
    monthly_delta: f64,
}

pub fn run_sensitivity(ctx: &Context, args: SensitivityArgs) -> CommandResult {
    let persona = args.relocation.persona(ctx)?;
    let country = args.relocation.country(ctx)?;
    let calc = args.relocation.calculation_input(persona)?;

    let model = CashFlowModel::new(ctx.config.model.clone());
    let analysis = run_sensitivity_analysis(&model, persona, country, &calc)?;

    let results: Vec<SensitivityRow> = analysis
        .sweeps
        .iter()
        .flat_map(|sweep| {
            sweep.points.iter().map(move |p| SensitivityRow {
                variable: sweep.variable.name(),
                mode: sweep.mode,
                test_value: p.test_value,
                roi: p.roi,
                substituted: p.substituted,
            })
        })
        .collect();

    let tornado: Vec<_> = analysis
        .ranked()
        .into_iter()
        .map(|s| json!({ "variable": s.variable.name(), "swing": s.swing }))
        .collect();

    Ok(json!({
        "persona": persona.id,
        "country": country.id,
        "base_roi": analysis.base_roi,
        "tornado": tornado,
        "results": results,
    }))
}

pub fn run_scenario_analysis(ctx: &Context, args: ScenariosArgs) -> CommandResult {
    let persona = args.relocation.persona(ctx)?;
    let country = args.relocation.country(ctx)?;
    let calc = args.relocation.calculation_input(persona)?;

    let model = CashFlowModel::new(ctx.config.model.clone());
    let analysis = run_scenarios(&model, persona, country, &calc)?;

    let results: Vec<ScenarioRow> = analysis
        .scenarios
        .iter()
        .map(|s| ScenarioRow {
            scenario: s.kind.name(),
            roi: s.metrics.roi,
            roi_deviation: s.roi_deviation,
            npv: s.metrics.npv,
            irr_annual: s.metrics.irr_annual,
            payback_years: s.metrics.payback_years,
            monthly_delta: s.metrics.monthly_delta,
        })
        .collect();

    Ok(json!({
        "persona": persona.id,
        "country": country.id,
        "results": results,
    }))
}
