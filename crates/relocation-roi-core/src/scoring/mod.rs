//! Bounded risk and opportunity scores and the recommendation tier.
//!
//! Both scores are additive over their components and clamped to 0-100.
//! A score that cannot be formed (a NaN component) reads as the neutral 50.

pub mod opportunity;
pub mod recommendation;
pub mod risk;

pub use opportunity::{score_opportunity, OpportunityAssessment, OpportunityComponents};
pub use recommendation::{recommend, RecommendationTier};
pub use risk::{score_risk, RiskAssessment, RiskComponents};

use crate::types::{clamp, Score};

pub const MIN_SCORE: Score = 0.0;
pub const MAX_SCORE: Score = 100.0;
pub const NEUTRAL_SCORE: Score = 50.0;

fn bounded(total: f64) -> Score {
    if total.is_nan() {
        NEUTRAL_SCORE
    } else {
        clamp(total, MIN_SCORE, MAX_SCORE)
    }
}
