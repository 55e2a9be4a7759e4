use std::cmp::Ordering;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::input::CalculationInput;
use crate::reference::{CountryProfile, Persona};
use crate::scoring::RecommendationTier;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Score};
use crate::EngineResult;

use super::calculator::{CalculationResult, RoiEngine};

/// One row of a multi-country comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRanking {
    /// 1 = best
    pub rank: usize,
    pub country_id: String,
    pub country_name: String,
    pub roi: Percent,
    pub npv: Money,
    pub irr_annual: Percent,
    pub payback_years: Option<f64>,
    pub monthly_delta: Money,
    pub probability_positive_roi: f64,
    pub risk_score: Score,
    pub opportunity_score: Score,
    pub recommendation: RecommendationTier,
}

impl CountryRanking {
    fn from_result(result: &CalculationResult, country: &CountryProfile) -> Self {
        CountryRanking {
            rank: 0,
            country_id: country.id.clone(),
            country_name: country.name.clone(),
            roi: result.base.roi,
            npv: result.base.npv,
            irr_annual: result.base.irr_annual,
            payback_years: result.base.payback_years,
            monthly_delta: result.base.monthly_delta,
            probability_positive_roi: result.monte_carlo.probability_positive_roi,
            risk_score: result.risk_score,
            opportunity_score: result.opportunity_score,
            recommendation: result.recommendation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryComparison {
    pub persona_id: String,
    /// Sorted by ROI descending, ties broken by lower risk
    pub rankings: Vec<CountryRanking>,
    /// Highest-ROI destination
    pub best_country: Option<String>,
}

fn by_roi_then_risk(a: &CountryRanking, b: &CountryRanking) -> Ordering {
    b.roi
        .partial_cmp(&a.roi)
        .unwrap_or(Ordering::Equal)
        .then(a.risk_score.partial_cmp(&b.risk_score).unwrap_or(Ordering::Equal))
}

impl RoiEngine {
    /// Evaluate `persona` against every country in `countries` and rank them.
    pub fn compare_countries(
        &self,
        persona: &Persona,
        countries: &[CountryProfile],
        input: &CalculationInput,
    ) -> EngineResult<ComputationOutput<CountryComparison>> {
        let start = Instant::now();
        if countries.is_empty() {
            return Err(EngineError::InsufficientData(
                "At least one country is required for a comparison".into(),
            ));
        }

        let mut warnings: Vec<String> = Vec::new();
        let mut rankings: Vec<CountryRanking> = Vec::with_capacity(countries.len());

        for country in countries {
            let out = self.evaluate(persona, country, input);
            warnings.extend(out.warnings.into_iter().map(|w| format!("{}: {w}", country.id)));
            rankings.push(CountryRanking::from_result(&out.result, country));
        }

        rankings.sort_by(by_roi_then_risk);
        for (i, row) in rankings.iter_mut().enumerate() {
            row.rank = i + 1;
        }
        let best_country = rankings.first().map(|r| r.country_id.clone());

        let comparison = CountryComparison {
            persona_id: persona.id.clone(),
            rankings,
            best_country,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Multi-country relocation comparison ranked by ROI",
            &serde_json::json!({
                "persona": persona.id,
                "countries": countries.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
                "monte_carlo_iterations": self.config.monte_carlo.iterations,
            }),
            warnings,
            elapsed,
            comparison,
        ))
    }
}
