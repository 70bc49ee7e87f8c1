//! Rolling feature rows derived from snapshot history.

use serde::{Deserialize, Serialize};

use crate::{DayDate, UniverseId};

/// Per-title trailing-window statistics as of one date.
///
/// `edr_mom` and `edr_14d_vol` are `Option` because "missing" is a distinct
/// outcome from a true zero: an undefined momentum ratio or a volatility
/// over fewer than two observations must not masquerade as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub universe_id: UniverseId,
    pub as_of_date: DayDate,

    /// Mean EDR over observed days in the trailing mean window.
    pub edr_7d_mean: f64,
    /// Current-window mean over prior-window mean, minus one. `None` when
    /// the prior window is zero but the current is not.
    pub edr_mom: Option<f64>,
    /// Sample standard deviation of daily EDR over the trailing volatility
    /// window. `None` with fewer than two observations.
    pub edr_14d_vol: Option<f64>,
    /// Observed days / window length, in [0, 1]. Doubles as the eligibility
    /// gate at rebalance.
    pub coverage_7d: f64,

    /// Composite ranking statistic (configuration-selected score function).
    pub score: f64,
}
