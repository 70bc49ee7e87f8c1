//! Composite ranking scores.
//!
//! The score that orders titles at rebalance is a pluggable strategy chosen
//! by configuration, not a fixed formula. Every implementation must be
//! monotone increasing in the trailing EDR mean and in coverage, and
//! monotone decreasing in relative volatility.

use types::ScoreSpec;

/// Feature inputs a score function may draw on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Trailing-window EDR mean.
    pub edr_mean: f64,
    /// Trailing-window coverage in [0, 1].
    pub coverage: f64,
    /// Trailing-window EDR volatility, when defined.
    pub vol: Option<f64>,
}

/// Trait for composite ranking scores.
pub trait ScoreFunction: Send + Sync {
    /// The configuration variant this implementation answers to.
    fn spec(&self) -> ScoreSpec;

    /// Compute the score from feature inputs.
    fn score(&self, inputs: &ScoreInputs) -> f64;
}

/// Default score: mean EDR scaled by coverage and damped by relative
/// volatility.
///
/// `edr_mean * coverage / (1 + vol / edr_mean)`. A missing volatility (or a
/// zero mean, which makes the ratio meaningless) contributes no damping.
pub struct CoverageAdjusted;

impl ScoreFunction for CoverageAdjusted {
    fn spec(&self) -> ScoreSpec {
        ScoreSpec::CoverageAdjusted
    }

    fn score(&self, inputs: &ScoreInputs) -> f64 {
        let rel_vol = match inputs.vol {
            Some(vol) if inputs.edr_mean > 0.0 => vol / inputs.edr_mean,
            _ => 0.0,
        };
        inputs.edr_mean * inputs.coverage / (1.0 + rel_vol)
    }
}

/// Mean EDR alone. Coverage still gates eligibility downstream; it just does
/// not shade the ranking.
pub struct RawMean;

impl ScoreFunction for RawMean {
    fn spec(&self) -> ScoreSpec {
        ScoreSpec::RawMean
    }

    fn score(&self, inputs: &ScoreInputs) -> f64 {
        inputs.edr_mean
    }
}

/// Create a score function from its configuration spec.
pub fn create_score(spec: ScoreSpec) -> Box<dyn ScoreFunction> {
    match spec {
        ScoreSpec::CoverageAdjusted => Box::new(CoverageAdjusted),
        ScoreSpec::RawMean => Box::new(RawMean),
    }
}
