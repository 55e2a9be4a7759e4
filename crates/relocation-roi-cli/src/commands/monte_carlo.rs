use clap::Args;
use std::time::Instant;

use relocation_roi_core::with_metadata;

use super::{CommandResult, Context, RelocationArgs};

/// Arguments for a stand-alone Monte Carlo run
#[derive(Args)]
pub struct MonteCarloArgs {
    #[command(flatten)]
    pub relocation: RelocationArgs,

    /// Seed for reproducible results
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of trials (minimum 100)
    #[arg(long)]
    pub iterations: Option<u32>,
}

pub fn run_monte_carlo(ctx: &Context, args: MonteCarloArgs) -> CommandResult {
    let start = Instant::now();
    let persona = args.relocation.persona(ctx)?;
    let country = args.relocation.country(ctx)?;
    let sanitized = args.relocation.calculation_input(persona)?.sanitize();

    let simulator = ctx.engine(args.seed, args.iterations)?.simulator();
    let summary = simulator.run(persona, country, &sanitized.input)?;

    let output = with_metadata(
        "Monte Carlo simulation with correlated market, revenue, margin, success and cost shocks",
        &serde_json::json!({
            "persona": persona.id,
            "country": country.id,
            "iterations": simulator.config.iterations,
            "seed": simulator.config.seed,
            "shocks": simulator.config.shocks,
        }),
        sanitized.adjustments,
        start.elapsed().as_micros() as u64,
        summary,
    );
    Ok(serde_json::to_value(output)?)
}
