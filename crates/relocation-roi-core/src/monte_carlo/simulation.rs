use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cash_flow::{CashFlowModel, DestinationTerms};
use crate::error::EngineError;
use crate::input::CalculationInput;
use crate::reference::{CountryProfile, Persona};
use crate::types::{Money, Percent};
use crate::EngineResult;

use super::config::MonteCarloConfig;
use super::sampling::FactorSampler;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// ROI and NPV at one percentile of the simulated distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: Percent,
    pub roi: Percent,
    pub npv: Money,
}

/// A single histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
    pub frequency: f64,
}

/// Distribution summary of a Monte Carlo run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub iterations: u32,
    pub mean_roi: Percent,
    pub median_roi: Percent,
    pub std_roi: Percent,
    pub skew_roi: f64,
    pub min_roi: Percent,
    pub max_roi: Percent,
    pub mean_npv: Money,
    pub median_npv: Money,
    pub std_npv: Money,
    pub confidence_intervals: Vec<PercentileValue>,
    /// Share of trials with ROI above 0%
    pub probability_positive_roi: f64,
    /// Share of trials with ROI above 100%
    pub probability_roi_above_100: f64,
    /// 5th percentile ROI
    pub var_95: Percent,
    /// Mean ROI of the trials at or below the 5th percentile
    pub expected_shortfall: Percent,
    /// Mean payback over the trials that pay back; `None` if none do
    pub mean_payback_years: Option<f64>,
    pub payback_trials: u32,
    pub roi_histogram: Vec<HistogramBin>,
}

impl MonteCarloSummary {
    pub fn roi_percentile(&self, percentile: Percent) -> Option<Percent> {
        self.confidence_intervals
            .iter()
            .find(|p| p.percentile == percentile)
            .map(|p| p.roi)
    }

    pub fn npv_percentile(&self, percentile: Percent) -> Option<Money> {
        self.confidence_intervals
            .iter()
            .find(|p| p.percentile == percentile)
            .map(|p| p.npv)
    }
}

/// What one trial contributes to the summary.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TrialOutcome {
    roi: Percent,
    npv: Money,
    payback_years: Option<f64>,
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

/// Compute the percentile value from a **sorted** slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Build a histogram with `num_bins` equal-width bins.
fn build_histogram(sorted: &[f64], num_bins: usize) -> Vec<HistogramBin> {
    let min_val = sorted[0];
    let max_val = sorted[sorted.len() - 1];

    // Handle case where all values are the same
    if (max_val - min_val).abs() < f64::EPSILON {
        return vec![HistogramBin {
            lower: min_val,
            upper: max_val,
            count: sorted.len() as u32,
            frequency: 1.0,
        }];
    }

    let bin_width = (max_val - min_val) / num_bins as f64;
    let n = sorted.len() as f64;

    let mut bins: Vec<HistogramBin> = (0..num_bins)
        .map(|i| HistogramBin {
            lower: min_val + i as f64 * bin_width,
            upper: if i == num_bins - 1 {
                max_val
            } else {
                min_val + (i + 1) as f64 * bin_width
            },
            count: 0,
            frequency: 0.0,
        })
        .collect();

    for &val in sorted {
        let idx = (((val - min_val) / bin_width).floor() as usize).min(num_bins - 1);
        bins[idx].count += 1;
    }

    for bin in &mut bins {
        bin.frequency = bin.count as f64 / n;
    }

    bins
}

struct Moments {
    mean: f64,
    median: f64,
    std_dev: f64,
    skewness: f64,
}

/// Population moments of a **sorted** slice.
fn moments(sorted: &[f64]) -> Moments {
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;

    let median = if sorted.len() % 2 == 0 {
        let mid = sorted.len() / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    };

    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let skewness = if std_dev > f64::EPSILON {
        sorted
            .iter()
            .map(|v| ((v - mean) / std_dev).powi(3))
            .sum::<f64>()
            / n
    } else {
        0.0
    };

    Moments {
        mean,
        median,
        std_dev,
        skewness,
    }
}

fn sort_floats(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
}

fn summarize(outcomes: &[TrialOutcome], config: &MonteCarloConfig) -> EngineResult<MonteCarloSummary> {
    if outcomes.is_empty() {
        return Err(EngineError::InsufficientData(
            "No Monte Carlo trials completed".into(),
        ));
    }

    let mut rois: Vec<f64> = outcomes.iter().map(|o| o.roi).collect();
    let mut npvs: Vec<f64> = outcomes.iter().map(|o| o.npv).collect();
    sort_floats(&mut rois);
    sort_floats(&mut npvs);

    let n = rois.len() as f64;
    let roi_moments = moments(&rois);
    let npv_moments = moments(&npvs);

    let confidence_intervals = config
        .confidence_levels
        .iter()
        .map(|&p| PercentileValue {
            percentile: p,
            roi: percentile_sorted(&rois, p),
            npv: percentile_sorted(&npvs, p),
        })
        .collect();

    let var_95 = percentile_sorted(&rois, 5.0);
    let tail: Vec<f64> = rois.iter().copied().filter(|r| *r <= var_95).collect();
    let expected_shortfall = if tail.is_empty() {
        var_95
    } else {
        tail.iter().sum::<f64>() / tail.len() as f64
    };

    let paybacks: Vec<f64> = outcomes.iter().filter_map(|o| o.payback_years).collect();
    let mean_payback_years = if paybacks.is_empty() {
        None
    } else {
        Some(paybacks.iter().sum::<f64>() / paybacks.len() as f64)
    };

    Ok(MonteCarloSummary {
        iterations: outcomes.len() as u32,
        mean_roi: roi_moments.mean,
        median_roi: roi_moments.median,
        std_roi: roi_moments.std_dev,
        skew_roi: roi_moments.skewness,
        min_roi: rois[0],
        max_roi: rois[rois.len() - 1],
        mean_npv: npv_moments.mean,
        median_npv: npv_moments.median,
        std_npv: npv_moments.std_dev,
        confidence_intervals,
        probability_positive_roi: rois.iter().filter(|r| **r > 0.0).count() as f64 / n,
        probability_roi_above_100: rois.iter().filter(|r| **r > 100.0).count() as f64 / n,
        var_95,
        expected_shortfall,
        mean_payback_years,
        payback_trials: paybacks.len() as u32,
        roi_histogram: build_histogram(&rois, config.histogram_bins),
    })
}

/// Seed for one trial, derived from the run seed with a SplitMix64 step so
/// that neighbouring trials and neighbouring run seeds do not overlap.
fn trial_seed(base_seed: u64, trial: u32) -> u64 {
    let mut z = base_seed.wrapping_add((trial as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Runs correlated trials of the cash-flow model.
///
/// Each trial owns an RNG seeded from the run seed and its index, so a seeded
/// run gives identical results whether trials run on one thread or many.
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    pub model: CashFlowModel,
    pub config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    pub fn new(model: CashFlowModel, config: MonteCarloConfig) -> Self {
        MonteCarloSimulator { model, config }
    }

    /// Run with the configured seed, or a fresh one from entropy.
    pub fn run(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
    ) -> EngineResult<MonteCarloSummary> {
        let seed = match self.config.seed {
            Some(s) => s,
            None => StdRng::from_entropy().gen(),
        };
        self.simulate(persona, country, input, seed, None)
    }

    /// Run with the run seed drawn from a caller-supplied random source.
    pub fn run_with_rng<R: Rng>(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
        rng: &mut R,
    ) -> EngineResult<MonteCarloSummary> {
        let seed = rng.gen();
        self.simulate(persona, country, input, seed, None)
    }

    /// Run that stops at the next trial boundary once `cancel` is set.
    /// A cancelled run returns [`EngineError::Cancelled`] and no partial
    /// statistics.
    pub fn run_cancellable(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
        seed: u64,
        cancel: &AtomicBool,
    ) -> EngineResult<MonteCarloSummary> {
        self.simulate(persona, country, input, seed, Some(cancel))
    }

    fn simulate(
        &self,
        persona: &Persona,
        country: &CountryProfile,
        input: &CalculationInput,
        seed: u64,
        cancel: Option<&AtomicBool>,
    ) -> EngineResult<MonteCarloSummary> {
        self.config.validate()?;
        input.validate()?;
        if self.config.is_undersampled() {
            warn!(iterations = self.config.iterations, "Few Monte Carlo trials, percentiles are coarse");
        }

        let sampler = FactorSampler::new(&self.config.shocks)?;
        let terms = DestinationTerms::from(country);
        let base_input = input.sanitized();
        let iterations = self.config.iterations;
        let is_cancelled = || cancel.is_some_and(|c| c.load(Ordering::Relaxed));

        let trial = |i: u32| -> Option<EngineResult<TrialOutcome>> {
            if is_cancelled() {
                return None;
            }
            let mut rng = StdRng::seed_from_u64(trial_seed(seed, i));
            let factors = sampler.draw(&mut rng);
            let (trial_input, trial_terms) = factors.apply(sampler.params(), &base_input, &terms);
            Some(
                self.model
                    .project(persona.success_multiplier, &trial_terms, &trial_input)
                    .map(|m| TrialOutcome {
                        roi: m.roi,
                        npv: m.npv,
                        payback_years: m.payback_years,
                    }),
            )
        };

        #[cfg(feature = "parallel")]
        let results: Vec<Option<EngineResult<TrialOutcome>>> =
            (0..iterations).into_par_iter().map(trial).collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Option<EngineResult<TrialOutcome>>> = (0..iterations).map(trial).collect();

        if is_cancelled() {
            let completed = results.iter().filter(|r| r.is_some()).count() as u32;
            debug!(completed, requested = iterations, "Monte Carlo run cancelled");
            return Err(EngineError::Cancelled {
                completed,
                requested: iterations,
            });
        }

        let outcomes = results
            .into_iter()
            .flatten()
            .collect::<EngineResult<Vec<TrialOutcome>>>()?;

        summarize(&outcomes, &self.config)
    }
}

/// Run `iterations` trials with default shocks and an entropy seed.
pub fn run_monte_carlo(
    persona: &Persona,
    country: &CountryProfile,
    input: &CalculationInput,
    iterations: u32,
) -> EngineResult<MonteCarloSummary> {
    let config = MonteCarloConfig {
        iterations,
        ..Default::default()
    };
    MonteCarloSimulator::new(CashFlowModel::default(), config).run(persona, country, input)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Catalog;
    use approx::assert_relative_eq;

    const SEED: u64 = 42;

    fn fixtures() -> (Persona, CountryProfile) {
        let catalog = Catalog::builtin();
        (
            catalog.persona("tech_startup").unwrap().clone(),
            catalog.country("UAE").unwrap().clone(),
        )
    }

    fn simulator(iterations: u32) -> MonteCarloSimulator {
        MonteCarloSimulator::new(
            CashFlowModel::default(),
            MonteCarloConfig {
                iterations,
                ..MonteCarloConfig::seeded(SEED)
            },
        )
    }

    #[test]
    fn test_basic_run() {
        let (persona, country) = fixtures();
        let s = simulator(1_000)
            .run(&persona, &country, &CalculationInput::default())
            .unwrap();
        assert_eq!(s.iterations, 1_000);
        assert_eq!(s.confidence_intervals.len(), 7);
        assert!(s.std_roi > 0.0);
        assert!(s.mean_roi > 0.0);
    }

    #[test]
    fn test_seeded_reproducibility() {
        let (persona, country) = fixtures();
        let sim = simulator(2_000);
        let input = CalculationInput::default();
        let a = sim.run(&persona, &country, &input).unwrap();
        let b = sim.run(&persona, &country, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let (persona, country) = fixtures();
        let input = CalculationInput::default();
        let a = simulator(500).run(&persona, &country, &input).unwrap();
        let mut other = simulator(500);
        other.config.seed = Some(SEED + 1);
        let b = other.run(&persona, &country, &input).unwrap();
        assert_ne!(a.mean_roi, b.mean_roi);
    }

    #[test]
    fn test_injected_rng_is_deterministic() {
        let (persona, country) = fixtures();
        let sim = simulator(300);
        let input = CalculationInput::default();
        let a = sim
            .run_with_rng(&persona, &country, &input, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = sim
            .run_with_rng(&persona, &country, &input, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_percentile_ordering() {
        let (persona, country) = fixtures();
        let s = simulator(1_000)
            .run(&persona, &country, &CalculationInput::default())
            .unwrap();
        for pair in s.confidence_intervals.windows(2) {
            assert!(pair[0].roi <= pair[1].roi);
            assert!(pair[0].npv <= pair[1].npv);
        }
        assert_eq!(s.roi_percentile(5.0), Some(s.var_95));
        assert_eq!(s.roi_percentile(50.0), Some(s.median_roi));
        assert!(s.min_roi <= s.var_95 && s.var_95 <= s.max_roi);
    }

    #[test]
    fn test_expected_shortfall_below_var() {
        let (persona, country) = fixtures();
        let s = simulator(1_000)
            .run(&persona, &country, &CalculationInput::default())
            .unwrap();
        assert!(s.expected_shortfall <= s.var_95);
        assert!(s.expected_shortfall >= s.min_roi);
    }

    #[test]
    fn test_probabilities_bounded_and_ordered() {
        let (persona, country) = fixtures();
        let s = simulator(1_000)
            .run(&persona, &country, &CalculationInput::default())
            .unwrap();
        assert!((0.0..=1.0).contains(&s.probability_positive_roi));
        assert!(s.probability_roi_above_100 <= s.probability_positive_roi);
    }

    #[test]
    fn test_histogram_counts_every_trial() {
        let (persona, country) = fixtures();
        let s = simulator(800)
            .run(&persona, &country, &CalculationInput::default())
            .unwrap();
        assert_eq!(s.roi_histogram.len(), 20);
        let total: u32 = s.roi_histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 800);
    }

    #[test]
    fn test_losing_relocation_never_pays_back() {
        let (persona, country) = fixtures();
        let input = CalculationInput {
            current_revenue: 200_000.0,
            current_margin: 60.0,
            current_corp_tax: 0.0,
            current_pers_tax: 0.0,
            revenue_multiplier: 0.1,
            ..Default::default()
        };
        let s = simulator(300).run(&persona, &country, &input).unwrap();
        assert_eq!(s.mean_payback_years, None);
        assert_eq!(s.payback_trials, 0);
        assert_eq!(s.probability_positive_roi, 0.0);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let (persona, country) = fixtures();
        assert!(simulator(0)
            .run(&persona, &country, &CalculationInput::default())
            .is_err());
    }

    #[test]
    fn test_small_run_still_summarizes() {
        let (persona, country) = fixtures();
        let s = simulator(10)
            .run(&persona, &country, &CalculationInput::default())
            .unwrap();
        assert_eq!(s.iterations, 10);
        assert!(s.min_roi <= s.median_roi && s.median_roi <= s.max_roi);
    }

    #[test]
    fn test_cancelled_run_returns_no_statistics() {
        let (persona, country) = fixtures();
        let cancel = AtomicBool::new(true);
        match simulator(500).run_cancellable(
            &persona,
            &country,
            &CalculationInput::default(),
            SEED,
            &cancel,
        ) {
            Err(EngineError::Cancelled { completed, requested }) => {
                assert_eq!(completed, 0);
                assert_eq!(requested, 500);
            }
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[test]
    fn test_uncancelled_run_matches_plain_run() {
        let (persona, country) = fixtures();
        let sim = simulator(400);
        let input = CalculationInput::default();
        let cancel = AtomicBool::new(false);
        let a = sim
            .run_cancellable(&persona, &country, &input, SEED, &cancel)
            .unwrap();
        let b = sim.run(&persona, &country, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&sorted, 50.0), 3.0);
        assert_relative_eq!(percentile_sorted(&sorted, 10.0), 1.4, epsilon = 1e-12);
        assert_eq!(percentile_sorted(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn test_constant_sample_has_zero_skew() {
        let m = moments(&[3.0, 3.0, 3.0]);
        assert_eq!(m.std_dev, 0.0);
        assert_eq!(m.skewness, 0.0);
    }

    #[test]
    fn test_trial_seeds_are_distinct() {
        let seeds: std::collections::HashSet<u64> = (0..1_000).map(|i| trial_seed(SEED, i)).collect();
        assert_eq!(seeds.len(), 1_000);
    }
}
