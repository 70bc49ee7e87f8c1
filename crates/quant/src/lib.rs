//! Quantitative primitives for the RTE index engine.
//!
//! - [`stats`] - statistical utilities (mean, median, variance, CV)
//! - [`score`] - pluggable composite ranking scores

pub mod score;
pub mod stats;

pub use score::{create_score, CoverageAdjusted, RawMean, ScoreFunction, ScoreInputs};
