use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{Money, Percent, Rate};
use crate::EngineResult;

use super::strings;

/// Weight used for a risk category the profile does not list.
pub const DEFAULT_RISK_WEIGHT: Rate = 0.1;

/// Named country risk categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Political,
    Economic,
    Regulatory,
}

/// Reference record for a destination country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    /// Catalog key (e.g. "UAE")
    pub id: String,
    pub name: String,
    /// Corporate tax rate as a fraction
    pub corp_tax: Rate,
    /// Personal tax rate as a fraction
    pub pers_tax: Rate,
    /// Average monthly living cost
    pub living_cost: Money,
    /// Average monthly business operating cost
    pub business_cost: Money,
    /// One-time relocation and setup cost
    pub setup_cost: Money,
    pub currency: String,
    /// Expected market growth in percent
    pub market_growth: Percent,
    /// Ease of doing business (0-10)
    pub ease_score: f64,
    /// Banking system quality (0-10)
    pub banking_score: f64,
    /// Ease of forming partnerships (0-10)
    pub partnership_score: f64,
    /// Visa or residency routes, primary first
    pub visa_options: Vec<String>,
    /// Probability weights per risk category, each in [0, 1]
    pub risk_factors: BTreeMap<RiskCategory, Rate>,
    /// Monthly cash-flow multipliers, January first
    pub seasonality: [f64; 12],
    pub special_programs: Vec<String>,
    pub recent_changes: String,
    /// Market sentiment in [0, 1]
    pub sentiment: f64,
}

impl CountryProfile {
    /// Risk weight for a category, falling back to [`DEFAULT_RISK_WEIGHT`].
    pub fn risk_weight(&self, category: RiskCategory) -> Rate {
        self.risk_factors
            .get(&category)
            .copied()
            .unwrap_or(DEFAULT_RISK_WEIGHT)
    }

    /// Recommended visa route.
    pub fn primary_visa(&self) -> Option<&str> {
        self.visa_options.first().map(String::as_str)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let field = |name: &str| format!("country:{} {name}", self.id);

        if self.id.trim().is_empty() {
            return Err(EngineError::InvalidInput {
                field: "country.id".into(),
                reason: "Country id must not be empty".into(),
            });
        }
        for (name, value) in [("corp_tax", self.corp_tax), ("pers_tax", self.pers_tax)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidInput {
                    field: field(name),
                    reason: "Tax rate must be a fraction between 0 and 1".into(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.sentiment) {
            return Err(EngineError::InvalidInput {
                field: field("sentiment"),
                reason: "Sentiment must be between 0 and 1".into(),
            });
        }
        for (category, weight) in &self.risk_factors {
            if !(0.0..=1.0).contains(weight) {
                return Err(EngineError::InvalidInput {
                    field: field(&format!("risk_factors.{category:?}")),
                    reason: "Risk weight must be between 0 and 1".into(),
                });
            }
        }
        for (name, value) in [
            ("living_cost", self.living_cost),
            ("business_cost", self.business_cost),
            ("setup_cost", self.setup_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidInput {
                    field: field(name),
                    reason: "Cost must be a non-negative number".into(),
                });
            }
        }
        if self.seasonality.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(EngineError::InvalidInput {
                field: field("seasonality"),
                reason: "Seasonality multipliers must be non-negative numbers".into(),
            });
        }
        Ok(())
    }
}

fn risks(political: Rate, economic: Rate, regulatory: Rate) -> BTreeMap<RiskCategory, Rate> {
    BTreeMap::from([
        (RiskCategory::Political, political),
        (RiskCategory::Economic, economic),
        (RiskCategory::Regulatory, regulatory),
    ])
}

/// The ten destination countries shipped with the engine.
pub fn builtin_countries() -> Vec<CountryProfile> {
    vec![
        CountryProfile {
            id: "UAE".into(),
            name: "UAE (Dubai/Abu Dhabi)".into(),
            // Corporate tax applies above AED 375k of profit since 2023
            corp_tax: 0.09,
            pers_tax: 0.00,
            living_cost: 9_200.0,
            business_cost: 2_200.0,
            setup_cost: 48_000.0,
            currency: "AED".into(),
            market_growth: 9.1,
            ease_score: 9.6,
            banking_score: 9.2,
            partnership_score: 9.6,
            visa_options: strings(&["Golden Visa (10yr)", "Green Visa (5yr)", "Freelancer Visa", "Investor Visa"]),
            risk_factors: risks(0.08, 0.12, 0.06),
            seasonality: [1.2, 1.1, 1.0, 0.9, 0.7, 0.6, 0.5, 0.6, 0.9, 1.1, 1.3, 1.4],
            special_programs: strings(&["DIFC License", "ADGM License", "Free Zone Setup"]),
            recent_changes: "Corporate tax introduced 2023, expanded Golden Visa criteria 2024".into(),
            sentiment: 0.92,
        },
        CountryProfile {
            id: "Singapore".into(),
            name: "Singapore".into(),
            corp_tax: 0.17,
            pers_tax: 0.24,
            living_cost: 8_800.0,
            business_cost: 2_400.0,
            setup_cost: 42_000.0,
            currency: "SGD".into(),
            market_growth: 7.2,
            ease_score: 9.8,
            banking_score: 9.8,
            partnership_score: 9.4,
            visa_options: strings(&["Tech.Pass", "Entrepreneur Pass", "ONE Pass", "Employment Pass"]),
            risk_factors: risks(0.02, 0.08, 0.04),
            seasonality: [0.9, 0.85, 0.9, 1.0, 1.1, 1.2, 1.3, 1.25, 1.1, 1.0, 0.95, 1.0],
            special_programs: strings(&["MAS Fintech Sandbox", "Startup SG", "Global Investor Programme"]),
            recent_changes: "Tech.Pass launched 2024, enhanced startup ecosystem support".into(),
            sentiment: 0.89,
        },
        CountryProfile {
            id: "Portugal".into(),
            name: "Portugal".into(),
            corp_tax: 0.21,
            pers_tax: 0.48,
            living_cost: 2_800.0,
            business_cost: 650.0,
            setup_cost: 15_000.0,
            currency: "EUR".into(),
            market_growth: 5.4,
            ease_score: 8.2,
            banking_score: 8.1,
            partnership_score: 8.5,
            visa_options: strings(&["D2 Entrepreneur", "D7 Passive Income", "Tech Visa", "Startup Visa"]),
            risk_factors: risks(0.06, 0.18, 0.09),
            seasonality: [0.8, 0.8, 0.9, 1.0, 1.3, 1.5, 1.7, 1.6, 1.3, 1.1, 0.9, 0.9],
            special_programs: strings(&["NHR Tax Regime", "Portugal 2030", "Startup Portugal"]),
            recent_changes: "Golden Visa phased out 2023, NHR regime modified 2024".into(),
            sentiment: 0.76,
        },
        CountryProfile {
            id: "Spain".into(),
            name: "Spain".into(),
            corp_tax: 0.25,
            pers_tax: 0.47,
            living_cost: 3_200.0,
            business_cost: 750.0,
            setup_cost: 18_000.0,
            currency: "EUR".into(),
            market_growth: 4.8,
            ease_score: 7.9,
            banking_score: 8.3,
            partnership_score: 8.2,
            visa_options: strings(&["Entrepreneur Visa", "Investment Visa", "Digital Nomad Visa", "Non-Lucrative"]),
            risk_factors: risks(0.08, 0.22, 0.12),
            seasonality: [0.8, 0.8, 0.9, 1.1, 1.4, 1.6, 1.8, 1.7, 1.4, 1.2, 0.9, 0.8],
            special_programs: strings(&["Startup Law 2022", "Beckham Law", "ENISA Loans"]),
            recent_changes: "Digital Nomad Visa launched 2023, improved startup ecosystem".into(),
            sentiment: 0.78,
        },
        CountryProfile {
            id: "USA".into(),
            name: "USA (Delaware/Florida)".into(),
            // Federal rates; state taxes vary
            corp_tax: 0.21,
            pers_tax: 0.37,
            living_cost: 12_000.0,
            business_cost: 3_200.0,
            setup_cost: 85_000.0,
            currency: "USD".into(),
            market_growth: 6.8,
            ease_score: 8.6,
            banking_score: 9.4,
            partnership_score: 8.8,
            visa_options: strings(&["EB-5 Investor", "L-1 Intracompany", "E-2 Treaty Investor", "O-1 Extraordinary"]),
            risk_factors: risks(0.18, 0.14, 0.16),
            seasonality: [1.0, 0.95, 1.05, 1.15, 1.1, 1.05, 0.95, 0.9, 1.1, 1.2, 1.25, 1.4],
            special_programs: strings(&["EB-5 Regional Centers", "SBIR Grants", "State Startup Incentives"]),
            recent_changes: "EB-5 minimum increased to $800K, enhanced startup visa discussions".into(),
            sentiment: 0.82,
        },
        CountryProfile {
            id: "UK".into(),
            name: "United Kingdom".into(),
            corp_tax: 0.25,
            pers_tax: 0.45,
            living_cost: 7_200.0,
            business_cost: 1_800.0,
            setup_cost: 28_000.0,
            currency: "GBP".into(),
            market_growth: 3.8,
            ease_score: 8.4,
            banking_score: 9.1,
            partnership_score: 8.1,
            visa_options: strings(&["Innovator Founder", "Scale-up Visa", "Global Talent", "High Potential Individual"]),
            risk_factors: risks(0.15, 0.19, 0.11),
            seasonality: [0.9, 0.85, 0.9, 1.0, 1.1, 1.2, 1.3, 1.25, 1.1, 1.05, 1.0, 1.2],
            special_programs: strings(&["R&D Tax Credits", "SEIS/EIS Schemes", "Innovate UK Grants"]),
            recent_changes: "Innovator visa replaced 2023, HPI visa introduced for top graduates".into(),
            sentiment: 0.74,
        },
        CountryProfile {
            id: "Ireland".into(),
            name: "Ireland".into(),
            // 12.5% trading rate; personal rate includes USC and PRSI
            corp_tax: 0.125,
            pers_tax: 0.52,
            living_cost: 4_800.0,
            business_cost: 1_200.0,
            setup_cost: 22_000.0,
            currency: "EUR".into(),
            market_growth: 6.2,
            ease_score: 8.8,
            banking_score: 8.7,
            partnership_score: 8.7,
            visa_options: strings(&["Startup Entrepreneur Programme", "Investment Programme", "Critical Skills"]),
            risk_factors: risks(0.04, 0.16, 0.08),
            seasonality: [0.8, 0.8, 0.9, 1.0, 1.2, 1.4, 1.5, 1.4, 1.2, 1.1, 0.9, 0.9],
            special_programs: strings(&["R&D Tax Credit 25%", "Knowledge Development Box", "Employment Incentive"]),
            recent_changes: "Enhanced startup supports 2024, housing challenges persist".into(),
            sentiment: 0.81,
        },
        CountryProfile {
            id: "Malta".into(),
            name: "Malta".into(),
            // Headline rate; shareholder refunds lower the effective rate
            corp_tax: 0.35,
            pers_tax: 0.35,
            living_cost: 3_500.0,
            business_cost: 900.0,
            setup_cost: 25_000.0,
            currency: "EUR".into(),
            market_growth: 5.8,
            ease_score: 8.1,
            banking_score: 7.9,
            partnership_score: 8.4,
            visa_options: strings(&["Nomad Residence Permit", "Global Residence Programme", "Investment Programme"]),
            risk_factors: risks(0.07, 0.15, 0.10),
            seasonality: [0.7, 0.7, 0.8, 0.9, 1.2, 1.5, 1.8, 1.7, 1.4, 1.1, 0.9, 0.8],
            special_programs: strings(&["Malta Individual Investor Programme", "Highly Qualified Persons Rules"]),
            recent_changes: "Digital nomad permit enhanced 2024, gaming license updates".into(),
            sentiment: 0.79,
        },
        CountryProfile {
            id: "Greece".into(),
            name: "Greece".into(),
            corp_tax: 0.22,
            pers_tax: 0.44,
            living_cost: 2_200.0,
            business_cost: 550.0,
            setup_cost: 12_000.0,
            currency: "EUR".into(),
            market_growth: 4.2,
            ease_score: 7.6,
            banking_score: 7.4,
            partnership_score: 7.8,
            visa_options: strings(&["Golden Visa", "Digital Nomad Visa", "Investment Activity Permit"]),
            risk_factors: risks(0.12, 0.25, 0.14),
            seasonality: [0.6, 0.6, 0.8, 1.0, 1.3, 1.6, 1.9, 1.8, 1.5, 1.2, 0.9, 0.7],
            special_programs: strings(&["Non-Dom Regime", "Startup Greece", "Development Law Incentives"]),
            recent_changes: "Golden Visa minimum increased 2023, digital nomad visa launched".into(),
            sentiment: 0.72,
        },
        CountryProfile {
            id: "Cyprus".into(),
            name: "Cyprus".into(),
            corp_tax: 0.125,
            pers_tax: 0.35,
            living_cost: 3_800.0,
            business_cost: 1_100.0,
            setup_cost: 20_000.0,
            currency: "EUR".into(),
            market_growth: 5.6,
            ease_score: 8.0,
            banking_score: 7.8,
            partnership_score: 8.3,
            visa_options: strings(&["Category F (Investment)", "Digital Nomad Visa", "Pink Slip"]),
            risk_factors: risks(0.09, 0.18, 0.11),
            seasonality: [0.8, 0.8, 0.9, 1.0, 1.3, 1.6, 1.7, 1.6, 1.4, 1.2, 1.0, 0.9],
            special_programs: strings(&["IP Box Regime", "Notional Interest Deduction", "Non-Dom Programme"]),
            recent_changes: "Enhanced digital nomad provisions 2024, banking sector recovery".into(),
            sentiment: 0.77,
        },
    ]
}
