//! Per-request parameter bundle and its defensive clamp table.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::reference::Persona;
use crate::types::{clamp, Money, Percent};
use crate::EngineResult;

pub const DEFAULT_REVENUE: Money = 45_000.0;
pub const MIN_REVENUE: Money = 1_000.0;
pub const DEFAULT_MARGIN: Percent = 25.0;
pub const MIN_MARGIN: Percent = 1.0;
pub const MAX_MARGIN: Percent = 95.0;
pub const MAX_HORIZON_MONTHS: u32 = 600;
pub const MAX_DISCOUNT_RATE: Percent = 100.0;

/// Parameters for one relocation projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Current monthly revenue
    pub current_revenue: Money,
    /// Current profit margin in percent
    pub current_margin: Percent,
    /// Current corporate tax rate in percent
    pub current_corp_tax: Percent,
    /// Current personal tax rate in percent
    pub current_pers_tax: Percent,
    /// Current monthly living costs
    pub current_living: Money,
    /// Current monthly business costs
    pub current_business: Money,
    /// Expected revenue multiplier after relocation
    pub revenue_multiplier: f64,
    /// Expected margin change in percentage points
    pub margin_improvement: Percent,
    /// Probability of reaching the projection, 0-100
    pub success_probability: Percent,
    /// Projection length in months
    pub time_horizon_months: u32,
    /// Annual discount rate in percent
    pub discount_rate: Percent,
}

impl Default for CalculationInput {
    fn default() -> Self {
        CalculationInput {
            current_revenue: 65_000.0,
            current_margin: DEFAULT_MARGIN,
            current_corp_tax: 25.0,
            current_pers_tax: 35.0,
            current_living: 3_500.0,
            current_business: 800.0,
            revenue_multiplier: 1.5,
            margin_improvement: 8.0,
            success_probability: 75.0,
            time_horizon_months: 60,
            discount_rate: 8.0,
        }
    }
}

/// A sanitized input plus a note for every field that had to be adjusted.
#[derive(Debug, Clone)]
pub struct Sanitized {
    pub input: CalculationInput,
    pub adjustments: Vec<String>,
}

impl CalculationInput {
    /// Default bundle for a persona: its revenue and the midpoint of its
    /// margin range, everything else at the form defaults.
    pub fn for_persona(persona: &Persona) -> Self {
        CalculationInput {
            current_revenue: persona.typical_revenue,
            current_margin: persona.margin_midpoint(),
            ..CalculationInput::default()
        }
    }

    /// Reject fields that are not numbers at all. Out-of-range numbers are
    /// not errors; [`CalculationInput::sanitize`] clamps them.
    pub fn validate(&self) -> EngineResult<()> {
        let fields = [
            ("current_corp_tax", self.current_corp_tax),
            ("current_pers_tax", self.current_pers_tax),
            ("current_living", self.current_living),
            ("current_business", self.current_business),
            ("revenue_multiplier", self.revenue_multiplier),
            ("margin_improvement", self.margin_improvement),
            ("success_probability", self.success_probability),
            ("discount_rate", self.discount_rate),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(EngineError::InvalidInput {
                    field: field.into(),
                    reason: format!("Expected a finite number, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Clamp every field into its safe range, recording what changed.
    ///
    /// Revenue and margin fall back to their defaults when not finite, the
    /// same way a blank form field would.
    pub fn sanitize(&self) -> Sanitized {
        let mut adjustments = Vec::new();
        let mut out = self.clone();

        let revenue = if self.current_revenue.is_finite() {
            self.current_revenue
        } else {
            DEFAULT_REVENUE
        };
        out.current_revenue = revenue.max(MIN_REVENUE);

        let margin = if self.current_margin.is_finite() {
            self.current_margin
        } else {
            DEFAULT_MARGIN
        };
        out.current_margin = clamp(margin, MIN_MARGIN, MAX_MARGIN);

        out.current_corp_tax = clamp(self.current_corp_tax, 0.0, 100.0);
        out.current_pers_tax = clamp(self.current_pers_tax, 0.0, 100.0);
        out.current_living = self.current_living.max(0.0);
        out.current_business = self.current_business.max(0.0);
        out.revenue_multiplier = self.revenue_multiplier.max(0.0);
        out.success_probability = clamp(self.success_probability, 0.0, 100.0);
        out.time_horizon_months = self.time_horizon_months.clamp(1, MAX_HORIZON_MONTHS);
        out.discount_rate = clamp(self.discount_rate, 0.0, MAX_DISCOUNT_RATE);

        let mut note = |field: &str, from: String, to: String| {
            if from != to {
                adjustments.push(format!("{field} adjusted from {from} to {to}"));
            }
        };
        note("current_revenue", self.current_revenue.to_string(), out.current_revenue.to_string());
        note("current_margin", self.current_margin.to_string(), out.current_margin.to_string());
        note("current_corp_tax", self.current_corp_tax.to_string(), out.current_corp_tax.to_string());
        note("current_pers_tax", self.current_pers_tax.to_string(), out.current_pers_tax.to_string());
        note("current_living", self.current_living.to_string(), out.current_living.to_string());
        note("current_business", self.current_business.to_string(), out.current_business.to_string());
        note("revenue_multiplier", self.revenue_multiplier.to_string(), out.revenue_multiplier.to_string());
        note("success_probability", self.success_probability.to_string(), out.success_probability.to_string());
        note("time_horizon_months", self.time_horizon_months.to_string(), out.time_horizon_months.to_string());
        note("discount_rate", self.discount_rate.to_string(), out.discount_rate.to_string());

        Sanitized {
            input: out,
            adjustments,
        }
    }

    pub fn sanitized(&self) -> CalculationInput {
        self.sanitize().input
    }
}
