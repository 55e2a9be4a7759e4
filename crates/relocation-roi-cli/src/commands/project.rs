use clap::Args;
use std::time::Instant;

use relocation_roi_core::cash_flow::CashFlowModel;
use relocation_roi_core::with_metadata;

use super::{CommandResult, Context, RelocationArgs};

/// Arguments for the deterministic base projection
#[derive(Args)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub relocation: RelocationArgs,
}

pub fn run_project(ctx: &Context, args: ProjectArgs) -> CommandResult {
    let start = Instant::now();
    let persona = args.relocation.persona(ctx)?;
    let country = args.relocation.country(ctx)?;
    let sanitized = args.relocation.calculation_input(persona)?.sanitize();

    let model = CashFlowModel::new(ctx.config.model.clone());
    let metrics = model.compute_base_metrics(persona, country, &sanitized.input)?;

    let output = with_metadata(
        "Seasonal monthly cash-flow projection with compound growth, NPV, IRR and MIRR",
        &serde_json::json!({
            "persona": persona.id,
            "country": country.id,
            "model": model.assumptions,
            "input": sanitized.input,
        }),
        sanitized.adjustments,
        start.elapsed().as_micros() as u64,
        metrics,
    );
    Ok(serde_json::to_value(output)?)
}
