pub mod analyze;
pub mod compare;
pub mod monte_carlo;
pub mod project;
pub mod reference;
pub mod scenarios;

use clap::Args;
use serde_json::Value;
use tracing::debug;

use relocation_roi_core::engine::{EngineConfig, RoiEngine};
use relocation_roi_core::{CalculationInput, Catalog, CountryProfile, Persona};

use crate::input;

pub type CommandResult = Result<Value, Box<dyn std::error::Error>>;

/// Catalog and engine settings shared by every command.
pub struct Context {
    pub catalog: Catalog,
    pub config: EngineConfig,
}

impl Context {
    /// Built-in tables and default settings unless files override them.
    pub fn load(catalog: Option<&str>, config: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let catalog = match catalog {
            Some(path) => {
                let catalog: Catalog = input::file::read_document(path)?;
                catalog.validate()?;
                debug!(path, personas = catalog.personas.len(), countries = catalog.countries.len(), "loaded catalog");
                catalog
            }
            None => Catalog::builtin(),
        };
        let config = match config {
            Some(path) => {
                let config: EngineConfig = input::file::read_document(path)?;
                config.validate()?;
                debug!(path, "loaded engine config");
                config
            }
            None => EngineConfig::default(),
        };
        Ok(Context { catalog, config })
    }

    pub fn engine(&self, seed: Option<u64>, iterations: Option<u32>) -> Result<RoiEngine, Box<dyn std::error::Error>> {
        let mut config = self.config.clone();
        if let Some(seed) = seed {
            config.monte_carlo.seed = Some(seed);
        }
        if let Some(iterations) = iterations {
            config.monte_carlo.iterations = iterations;
        }
        Ok(RoiEngine::new(config)?)
    }
}

/// Persona, destination and projection inputs common to the analysis commands.
///
/// Inputs are layered: persona defaults, then `--input` file or piped JSON,
/// then individual flags.
#[derive(Args, Debug, Clone)]
pub struct RelocationArgs {
    /// Persona id (see `roi personas`)
    #[arg(long, default_value = "tech_startup")]
    pub persona: String,

    /// Destination country id (see `roi countries`)
    #[arg(long, default_value = "UAE")]
    pub country: String,

    /// Path to a JSON/YAML file with (partial) calculation input
    #[arg(long)]
    pub input: Option<String>,

    /// Current monthly revenue
    #[arg(long)]
    pub revenue: Option<f64>,

    /// Current profit margin (%)
    #[arg(long, allow_hyphen_values = true)]
    pub margin: Option<f64>,

    /// Current corporate tax rate (%)
    #[arg(long)]
    pub corp_tax: Option<f64>,

    /// Current personal tax rate (%)
    #[arg(long)]
    pub pers_tax: Option<f64>,

    /// Current monthly living costs
    #[arg(long)]
    pub living: Option<f64>,

    /// Current monthly business costs
    #[arg(long)]
    pub business: Option<f64>,

    /// Expected revenue multiplier after relocation
    #[arg(long)]
    pub revenue_multiplier: Option<f64>,

    /// Expected margin change (percentage points)
    #[arg(long, allow_hyphen_values = true)]
    pub margin_improvement: Option<f64>,

    /// Probability of success (%)
    #[arg(long)]
    pub success_probability: Option<f64>,

    /// Projection horizon in months
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Annual discount rate (%)
    #[arg(long)]
    pub discount_rate: Option<f64>,
}

impl RelocationArgs {
    pub fn persona<'a>(&self, ctx: &'a Context) -> Result<&'a Persona, Box<dyn std::error::Error>> {
        Ok(ctx.catalog.persona(&self.persona)?)
    }

    pub fn country<'a>(&self, ctx: &'a Context) -> Result<&'a CountryProfile, Box<dyn std::error::Error>> {
        Ok(ctx.catalog.country(&self.country)?)
    }

    /// Resolve the calculation input for `persona`.
    pub fn calculation_input(&self, persona: &Persona) -> Result<CalculationInput, Box<dyn std::error::Error>> {
        let overrides = if let Some(ref path) = self.input {
            Some(input::file::read_value(path)?)
        } else {
            input::stdin::read_stdin()?
        };

        let mut calc = match overrides {
            Some(value) => merge_input(CalculationInput::for_persona(persona), value)?,
            None => CalculationInput::for_persona(persona),
        };

        let flags = [
            (self.revenue, &mut calc.current_revenue),
            (self.margin, &mut calc.current_margin),
            (self.corp_tax, &mut calc.current_corp_tax),
            (self.pers_tax, &mut calc.current_pers_tax),
            (self.living, &mut calc.current_living),
            (self.business, &mut calc.current_business),
            (self.revenue_multiplier, &mut calc.revenue_multiplier),
            (self.margin_improvement, &mut calc.margin_improvement),
            (self.success_probability, &mut calc.success_probability),
            (self.discount_rate, &mut calc.discount_rate),
        ];
        for (flag, field) in flags {
            if let Some(v) = flag {
                *field = v;
            }
        }
        if let Some(h) = self.horizon {
            calc.time_horizon_months = h;
        }
        Ok(calc)
    }
}

/// Overlay the keys of a (possibly partial) JSON object onto `base`.
fn merge_input(base: CalculationInput, overrides: Value) -> Result<CalculationInput, Box<dyn std::error::Error>> {
    let Value::Object(fields) = overrides else {
        return Err("Calculation input must be a JSON/YAML object".into());
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(ref mut target) = merged {
        for (key, value) in fields {
            if !target.contains_key(&key) {
                return Err(format!("Unknown calculation input field '{key}'").into());
            }
            target.insert(key, value);
        }
    }
    Ok(serde_json::from_value(merged)?)
}
