use clap::Args;

use super::{CommandResult, Context, RelocationArgs};

/// Arguments for a full relocation analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub relocation: RelocationArgs,

    /// Monte Carlo seed for reproducible results
    #[arg(long)]
    pub seed: Option<u64>,

    /// Monte Carlo trials (minimum 100)
    #[arg(long)]
    pub iterations: Option<u32>,
}

pub fn run_analyze(ctx: &Context, args: AnalyzeArgs) -> CommandResult {
    let persona = args.relocation.persona(ctx)?;
    let country = args.relocation.country(ctx)?;
    let calc = args.relocation.calculation_input(persona)?;

    let engine = ctx.engine(args.seed, args.iterations)?;
    let output = engine.evaluate(persona, country, &calc);
    Ok(serde_json::to_value(output)?)
}
