use serde::{Deserialize, Serialize};

use crate::reference::{CountryProfile, Persona, RiskCategory};
use crate::types::{Percent, Score};

use super::bounded;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const POLITICAL_WEIGHT: f64 = 25.0;
const ECONOMIC_WEIGHT: f64 = 35.0;
const REGULATORY_WEIGHT: f64 = 25.0;
const SENTIMENT_WEIGHT: f64 = 15.0;
const VOLATILITY_CAP: f64 = 20.0;
const VOLATILITY_DIVISOR: f64 = 5.0;
const TOLERANCE_WEIGHT: f64 = 20.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Points contributed by each risk driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    pub political: Score,
    pub economic: Score,
    pub regulatory: Score,
    pub sentiment: Score,
    pub volatility: Score,
    pub risk_tolerance: Score,
    pub payback: Score,
}

impl RiskComponents {
    pub fn total(&self) -> f64 {
        self.political
            + self.economic
            + self.regulatory
            + self.sentiment
            + self.volatility
            + self.risk_tolerance
            + self.payback
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100, higher is riskier
    pub score: Score,
    pub components: RiskComponents,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Penalty for slow or absent payback.
fn payback_penalty(payback_years: Option<f64>) -> Score {
    match payback_years {
        None => 25.0,
        Some(y) if y > 5.0 => 15.0,
        Some(y) if y > 3.0 => 10.0,
        Some(y) if y > 2.0 => 5.0,
        Some(_) => 0.0,
    }
}

/// Risk of relocating `persona` to `country`.
///
/// `roi_volatility` is the standard deviation of simulated ROI in percent;
/// pass 0 when no simulation is available.
pub fn score_risk(
    persona: &Persona,
    country: &CountryProfile,
    payback_years: Option<f64>,
    roi_volatility: Percent,
) -> RiskAssessment {
    let components = RiskComponents {
        political: country.risk_weight(RiskCategory::Political) * POLITICAL_WEIGHT,
        economic: country.risk_weight(RiskCategory::Economic) * ECONOMIC_WEIGHT,
        regulatory: country.risk_weight(RiskCategory::Regulatory) * REGULATORY_WEIGHT,
        sentiment: (1.0 - country.sentiment) * SENTIMENT_WEIGHT,
        volatility: (roi_volatility / VOLATILITY_DIVISOR).min(VOLATILITY_CAP),
        risk_tolerance: (100.0 - persona.risk_tolerance) / 100.0 * TOLERANCE_WEIGHT,
        payback: payback_penalty(payback_years),
    };

    RiskAssessment {
        score: bounded(components.total()),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Catalog;
    use approx::assert_relative_eq;

    fn fixtures() -> (Persona, CountryProfile) {
        let catalog = Catalog::builtin();
        (
            catalog.persona("tech_startup").unwrap().clone(),
            catalog.country("UAE").unwrap().clone(),
        )
    }

    #[test]
    fn test_payback_penalty_bands() {
        assert_eq!(payback_penalty(None), 25.0);
        assert_eq!(payback_penalty(Some(6.0)), 15.0);
        assert_eq!(payback_penalty(Some(5.0)), 10.0);
        assert_eq!(payback_penalty(Some(3.5)), 10.0);
        assert_eq!(payback_penalty(Some(2.5)), 5.0);
        assert_eq!(payback_penalty(Some(2.0)), 0.0);
        assert_eq!(payback_penalty(Some(0.25)), 0.0);
    }

    #[test]
    fn test_components_sum_to_score() {
        let (persona, country) = fixtures();
        let risk = score_risk(&persona, &country, Some(0.5), 40.0);
        let c = &risk.components;
        assert_relative_eq!(
            c.political,
            country.risk_weight(RiskCategory::Political) * 25.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(c.volatility, 8.0, epsilon = 1e-12);
        assert_relative_eq!(c.risk_tolerance, (100.0 - persona.risk_tolerance) / 5.0, epsilon = 1e-12);
        assert_relative_eq!(risk.score, c.total(), epsilon = 1e-12);
    }

    #[test]
    fn test_volatility_capped() {
        let (persona, country) = fixtures();
        let risk = score_risk(&persona, &country, Some(1.0), 10_000.0);
        assert_eq!(risk.components.volatility, 20.0);
    }

    #[test]
    fn test_missing_category_uses_default_weight() {
        let (persona, mut country) = fixtures();
        country.risk_factors.clear();
        let risk = score_risk(&persona, &country, Some(1.0), 0.0);
        assert_relative_eq!(risk.components.political, 2.5, epsilon = 1e-12);
        assert_relative_eq!(risk.components.economic, 3.5, epsilon = 1e-12);
        assert_relative_eq!(risk.components.regulatory, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_score_clamped_to_100() {
        let (mut persona, mut country) = fixtures();
        persona.risk_tolerance = -500.0;
        for weight in country.risk_factors.values_mut() {
            *weight = 1.0;
        }
        country.sentiment = 0.0;
        let risk = score_risk(&persona, &country, None, 1_000.0);
        assert_eq!(risk.score, 100.0);
    }

    #[test]
    fn test_nan_volatility_is_capped() {
        let (persona, country) = fixtures();
        let risk = score_risk(&persona, &country, Some(1.0), f64::NAN);
        assert!((0.0..=100.0).contains(&risk.score));
    }
}
