mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::analyze::AnalyzeArgs;
use commands::compare::CompareArgs;
use commands::monte_carlo::MonteCarloArgs;
use commands::project::ProjectArgs;
use commands::scenarios::{ScenariosArgs, SensitivityArgs};
use commands::Context;

/// Risk-adjusted ROI of relocating a business to another country
#[derive(Parser)]
#[command(
    name = "roi",
    version,
    about = "Risk-adjusted ROI of relocating a business to another country",
    long_about = "Projects the monthly cash flows of relocating a business persona to a \
                  destination country and reports NPV, IRR, MIRR, payback, a correlated \
                  Monte Carlo distribution, sensitivity and scenario analysis, risk and \
                  opportunity scores and a recommendation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON/YAML catalog of personas and countries replacing the built-in tables
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// JSON/YAML engine configuration (model assumptions, Monte Carlo settings)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: projection, Monte Carlo, sensitivity, scenarios and scoring
    Analyze(AnalyzeArgs),
    /// Rank destination countries for one persona
    Compare(CompareArgs),
    /// Deterministic cash-flow projection only
    Project(ProjectArgs),
    /// Monte Carlo distribution of ROI and NPV
    MonteCarlo(MonteCarloArgs),
    /// One-at-a-time sensitivity of ROI to each input
    Sensitivity(SensitivityArgs),
    /// Pessimistic, realistic and optimistic scenarios
    Scenarios(ScenariosArgs),
    /// List the personas in the catalog
    Personas,
    /// List the countries in the catalog
    Countries,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let ctx = Context::load(cli.catalog.as_deref(), cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(&ctx, args),
        Commands::Compare(args) => commands::compare::run_compare(&ctx, args),
        Commands::Project(args) => commands::project::run_project(&ctx, args),
        Commands::MonteCarlo(args) => commands::monte_carlo::run_monte_carlo(&ctx, args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(&ctx, args),
        Commands::Scenarios(args) => commands::scenarios::run_scenario_analysis(&ctx, args),
        Commands::Personas => commands::reference::run_personas(&ctx),
        Commands::Countries => commands::reference::run_countries(&ctx),
        Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
    }
}

fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("roi {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    init_tracing(cli.verbose);
    let format = cli.output.clone();

    match run(cli) {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
