use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Money, Percent, Score};
use crate::EngineResult;

use super::strings;

/// An entrepreneur archetype considering relocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Catalog key (e.g. "tech_startup")
    pub id: String,
    /// Display name
    pub name: String,
    /// Baseline monthly revenue
    pub typical_revenue: Money,
    /// Risk appetite on a 0-100 scale
    pub risk_tolerance: Score,
    /// Primary business concerns, as tags
    pub key_concerns: Vec<String>,
    /// Factor applied to projected revenue after relocation
    pub success_multiplier: f64,
    /// Expected margin range in percent (min, max)
    pub margin_expectations: (Percent, Percent),
    /// Short narrative description
    pub description: String,
    /// Selector for the insight template used by presentation layers
    pub insight_key: String,
}

impl Persona {
    /// Midpoint of the expected margin range.
    pub fn margin_midpoint(&self) -> Percent {
        (self.margin_expectations.0 + self.margin_expectations.1) / 2.0
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::InvalidInput {
                field: "persona.id".into(),
                reason: "Persona id must not be empty".into(),
            });
        }
        if !self.typical_revenue.is_finite() || self.typical_revenue < 0.0 {
            return Err(EngineError::InvalidInput {
                field: format!("persona:{} typical_revenue", self.id),
                reason: "Typical revenue must be a non-negative number".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.risk_tolerance) {
            return Err(EngineError::InvalidInput {
                field: format!("persona:{} risk_tolerance", self.id),
                reason: "Risk tolerance must be between 0 and 100".into(),
            });
        }
        if !self.success_multiplier.is_finite() || self.success_multiplier < 0.0 {
            return Err(EngineError::InvalidInput {
                field: format!("persona:{} success_multiplier", self.id),
                reason: "Success multiplier must be a non-negative number".into(),
            });
        }
        let (lo, hi) = self.margin_expectations;
        if !(lo.is_finite() && hi.is_finite()) || lo > hi {
            return Err(EngineError::InvalidInput {
                field: format!("persona:{} margin_expectations", self.id),
                reason: "Margin range must be finite with min <= max".into(),
            });
        }
        Ok(())
    }
}

/// The six personas shipped with the engine.
pub fn builtin_personas() -> Vec<Persona> {
    vec![
        Persona {
            id: "tech_startup".into(),
            name: "Tech Startup Founder".into(),
            typical_revenue: 65_000.0,
            risk_tolerance: 85.0,
            key_concerns: strings(&["talent_access", "ip_protection", "scaling", "funding"]),
            success_multiplier: 1.6,
            margin_expectations: (20.0, 45.0),
            description: "Building the next unicorn with cutting-edge technology".into(),
            insight_key: "analytical_optimist".into(),
        },
        Persona {
            id: "crypto_trader".into(),
            name: "Crypto/DeFi Entrepreneur".into(),
            typical_revenue: 125_000.0,
            risk_tolerance: 95.0,
            key_concerns: strings(&["regulatory_clarity", "banking", "tax_optimization", "privacy"]),
            success_multiplier: 2.2,
            margin_expectations: (35.0, 75.0),
            description: "Navigating the digital asset revolution with strategic positioning".into(),
            insight_key: "risk_aware_pioneer".into(),
        },
        Persona {
            id: "consulting".into(),
            name: "Strategic Consultant".into(),
            typical_revenue: 45_000.0,
            risk_tolerance: 60.0,
            key_concerns: strings(&["client_proximity", "reputation", "networking", "expertise_transfer"]),
            success_multiplier: 1.2,
            margin_expectations: (50.0, 80.0),
            description: "Providing high-value strategic advice to enterprise clients".into(),
            insight_key: "relationship_focused".into(),
        },
        Persona {
            id: "ecommerce".into(),
            name: "E-commerce Entrepreneur".into(),
            typical_revenue: 75_000.0,
            risk_tolerance: 70.0,
            key_concerns: strings(&["logistics", "market_access", "compliance", "scalability"]),
            success_multiplier: 1.4,
            margin_expectations: (15.0, 35.0),
            description: "Building scalable online retail empires across global markets".into(),
            insight_key: "growth_focused".into(),
        },
        Persona {
            id: "real_estate".into(),
            name: "Real Estate Investor".into(),
            typical_revenue: 35_000.0,
            risk_tolerance: 50.0,
            key_concerns: strings(&["property_laws", "financing", "market_stability", "yield_optimization"]),
            success_multiplier: 1.0,
            margin_expectations: (12.0, 25.0),
            description: "Building wealth through strategic property investments".into(),
            insight_key: "conservative_builder".into(),
        },
        Persona {
            id: "content_creator".into(),
            name: "Digital Creator/Influencer".into(),
            typical_revenue: 55_000.0,
            risk_tolerance: 75.0,
            key_concerns: strings(&["internet_infrastructure", "tax_treaties", "lifestyle", "monetization"]),
            success_multiplier: 1.3,
            margin_expectations: (65.0, 90.0),
            description: "Monetizing creativity and building personal brand globally".into(),
            insight_key: "lifestyle_optimizer".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_personas_are_valid() {
        for p in builtin_personas() {
            p.validate().unwrap();
        }
    }

    #[test]
    fn test_margin_midpoint() {
        let tech = builtin_personas()
            .into_iter()
            .find(|p| p.id == "tech_startup")
            .unwrap();
        assert_eq!(tech.margin_midpoint(), 32.5);
    }

    #[test]
    fn test_inverted_margin_range_rejected() {
        let mut p = builtin_personas().remove(0);
        p.margin_expectations = (50.0, 10.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_risk_tolerance_out_of_range_rejected() {
        let mut p = builtin_personas().remove(0);
        p.risk_tolerance = 120.0;
        assert!(p.validate().is_err());
    }
}
