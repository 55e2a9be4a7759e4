use clap::Args;

use relocation_roi_core::CountryProfile;

use super::{CommandResult, Context, RelocationArgs};

/// Arguments for a multi-country comparison
#[derive(Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub relocation: RelocationArgs,

    /// Comma-separated country ids to compare (default: the whole catalog)
    #[arg(long, value_delimiter = ',')]
    pub countries: Option<Vec<String>>,

    /// Monte Carlo seed for reproducible results
    #[arg(long)]
    pub seed: Option<u64>,

    /// Monte Carlo trials per country (minimum 100)
    #[arg(long)]
    pub iterations: Option<u32>,
}

pub fn run_compare(ctx: &Context, args: CompareArgs) -> CommandResult {
    let persona = args.relocation.persona(ctx)?;
    let calc = args.relocation.calculation_input(persona)?;

    let countries: Vec<CountryProfile> = match args.countries {
        Some(ref ids) => ids
            .iter()
            .map(|id| ctx.catalog.country(id.trim()).cloned())
            .collect::<Result<_, _>>()?,
        None => ctx.catalog.countries.clone(),
    };

    let engine = ctx.engine(args.seed, args.iterations)?;
    let output = engine.compare_countries(persona, &countries, &calc)?;
    Ok(serde_json::to_value(output)?)
}
