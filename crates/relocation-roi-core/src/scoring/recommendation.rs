use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Percent, Score};

/// Investment recommendation, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationTier {
    StrongBuy,
    Buy,
    HoldConsider,
    WeakHold,
    Avoid,
}

/// (tier, minimum ROI %, risk score ceiling exclusive)
const THRESHOLDS: [(RecommendationTier, Percent, Score); 4] = [
    (RecommendationTier::StrongBuy, 200.0, 30.0),
    (RecommendationTier::Buy, 150.0, 40.0),
    (RecommendationTier::HoldConsider, 100.0, 60.0),
    (RecommendationTier::WeakHold, 50.0, 70.0),
];

impl RecommendationTier {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationTier::StrongBuy => "STRONG BUY",
            RecommendationTier::Buy => "BUY",
            RecommendationTier::HoldConsider => "HOLD/CONSIDER",
            RecommendationTier::WeakHold => "WEAK HOLD",
            RecommendationTier::Avoid => "AVOID",
        }
    }

    pub fn rationale(&self) -> &'static str {
        match self {
            RecommendationTier::StrongBuy => "Exceptional opportunity with manageable risk",
            RecommendationTier::Buy => "Strong opportunity with acceptable risk profile",
            RecommendationTier::HoldConsider => "Decent opportunity, monitor risk factors",
            RecommendationTier::WeakHold => "Marginal opportunity, consider alternatives",
            RecommendationTier::Avoid => "Poor risk-adjusted returns, seek better opportunities",
        }
    }

    /// Label and rationale as one line, e.g. `BUY - Strong opportunity ...`.
    pub fn headline(&self) -> String {
        format!("{} - {}", self.label(), self.rationale())
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// First tier whose ROI floor and risk ceiling are both met.
pub fn recommend(roi: Percent, risk_score: Score) -> RecommendationTier {
    THRESHOLDS
        .iter()
        .find(|(_, min_roi, max_risk)| roi >= *min_roi && risk_score < *max_risk)
        .map(|(tier, _, _)| *tier)
        .unwrap_or(RecommendationTier::Avoid)
}
