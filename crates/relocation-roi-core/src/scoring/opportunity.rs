use serde::{Deserialize, Serialize};

use crate::reference::{CountryProfile, Persona};
use crate::types::{Percent, Score};

use super::bounded;

const ROI_CAP: f64 = 40.0;
const ROI_DIVISOR: f64 = 5.0;
const GROWTH_WEIGHT: f64 = 2.0;
const ENVIRONMENT_WEIGHT: f64 = 2.0;
const SENTIMENT_WEIGHT: f64 = 10.0;
const PROFILE_FIT_WEIGHT: f64 = 10.0;

/// Points contributed by each opportunity driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityComponents {
    /// ROI / 5, capped at 40 (200% ROI)
    pub roi: Score,
    pub market_growth: Score,
    /// Mean of the doubled ease-of-business and banking scores
    pub environment: Score,
    pub sentiment: Score,
    pub profile_fit: Score,
}

impl OpportunityComponents {
    pub fn total(&self) -> f64 {
        self.roi + self.market_growth + self.environment + self.sentiment + self.profile_fit
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityAssessment {
    /// 0-100, higher is more attractive
    pub score: Score,
    pub components: OpportunityComponents,
}

/// Opportunity of relocating `persona` to `country` at the given base ROI.
pub fn score_opportunity(persona: &Persona, country: &CountryProfile, roi: Percent) -> OpportunityAssessment {
    let components = OpportunityComponents {
        roi: (roi / ROI_DIVISOR).min(ROI_CAP),
        market_growth: country.market_growth * GROWTH_WEIGHT,
        environment: (country.ease_score * ENVIRONMENT_WEIGHT + country.banking_score * ENVIRONMENT_WEIGHT)
            / 2.0,
        sentiment: country.sentiment * SENTIMENT_WEIGHT,
        profile_fit: persona.success_multiplier * PROFILE_FIT_WEIGHT,
    };

    OpportunityAssessment {
        score: bounded(components.total()),
        components,
    }
}
