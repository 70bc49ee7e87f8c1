//! Injected configuration for every pipeline stage.
//!
//! All numeric policy lives here; the engine crates never hardcode model
//! constants. Each struct carries defaults, builder-style setters, and a
//! `validate()` that rejects incoherent parameter sets before any stage
//! runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameter validation failure.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("pcr_floor ({floor}) must not exceed pcr_cap ({cap})")]
    PcrBoundsInverted { floor: f64, cap: f64 },
    #[error("{name} must lie in [0, 1], got {value}")]
    NotAFraction { name: &'static str, value: f64 },
    #[error("{name} must be at least 1")]
    ZeroWindow { name: &'static str },
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive { name, value })
    }
}

fn require_fraction(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ParamsError::NotAFraction { name, value })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EDR Estimator Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters of the EDR model (daily revenue proxy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdrParams {
    /// DAU per concurrent player.
    pub alpha: f64,
    /// Base purchase conversion rate per log-catalog-item.
    pub base_rate: f64,
    /// Premium-revenue weight on engagement.
    pub gamma: f64,
    /// Lower clip for the conversion-rate proxy. Applied unconditionally,
    /// so zero-monetization titles still receive this baseline rate.
    pub pcr_floor: f64,
    /// Upper clip for the conversion-rate proxy.
    pub pcr_cap: f64,
    /// Scale applied to the raw engagement rate composite.
    pub engagement_scale: f64,
    /// Upper clip for the scaled engagement score.
    pub engagement_cap: f64,
}

impl Default for EdrParams {
    fn default() -> Self {
        Self {
            alpha: 20.0,
            base_rate: 0.01,
            gamma: 0.02,
            pcr_floor: 0.001,
            pcr_cap: 0.05,
            engagement_scale: 50.0,
            engagement_cap: 1.5,
        }
    }
}

impl EdrParams {
    /// Set the DAU-per-CCU multiplier.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the base conversion rate.
    pub fn with_base_rate(mut self, base_rate: f64) -> Self {
        self.base_rate = base_rate;
        self
    }

    /// Set the premium-revenue weight.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the conversion-rate clips.
    pub fn with_pcr_bounds(mut self, floor: f64, cap: f64) -> Self {
        self.pcr_floor = floor;
        self.pcr_cap = cap;
        self
    }

    /// Set the engagement scale and cap.
    pub fn with_engagement(mut self, scale: f64, cap: f64) -> Self {
        self.engagement_scale = scale;
        self.engagement_cap = cap;
        self
    }

    /// All parameters must be positive and the PCR clips ordered.
    pub fn validate(&self) -> Result<(), ParamsError> {
        require_positive("alpha", self.alpha)?;
        require_positive("base_rate", self.base_rate)?;
        require_positive("gamma", self.gamma)?;
        require_positive("pcr_floor", self.pcr_floor)?;
        require_positive("pcr_cap", self.pcr_cap)?;
        require_positive("engagement_scale", self.engagement_scale)?;
        require_positive("engagement_cap", self.engagement_cap)?;
        if self.pcr_floor > self.pcr_cap {
            return Err(ParamsError::PcrBoundsInverted {
                floor: self.pcr_floor,
                cap: self.pcr_cap,
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rolling Feature Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Selects the composite score function used to rank titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSpec {
    /// Mean EDR scaled by coverage and damped by relative volatility:
    /// `edr_7d_mean * coverage_7d / (1 + vol / mean)`.
    #[default]
    CoverageAdjusted,
    /// Mean EDR alone; coverage still gates eligibility at rebalance.
    RawMean,
}

/// Parameters of the rolling feature aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingParams {
    /// Trailing window for the EDR mean and for coverage, in days.
    pub mean_window: u32,
    /// Trailing window for EDR volatility, in days.
    pub vol_window: u32,
    /// Minimum coverage for index eligibility at rebalance.
    pub min_coverage: f64,
    /// Composite score selection.
    pub score: ScoreSpec,
}

impl Default for RollingParams {
    fn default() -> Self {
        Self {
            mean_window: 7,
            vol_window: 14,
            min_coverage: 0.6,
            score: ScoreSpec::CoverageAdjusted,
        }
    }
}

impl RollingParams {
    /// Set the mean/coverage window length.
    pub fn with_mean_window(mut self, days: u32) -> Self {
        self.mean_window = days;
        self
    }

    /// Set the volatility window length.
    pub fn with_vol_window(mut self, days: u32) -> Self {
        self.vol_window = days;
        self
    }

    /// Set the eligibility coverage floor.
    pub fn with_min_coverage(mut self, coverage: f64) -> Self {
        self.min_coverage = coverage;
        self
    }

    /// Select the score function.
    pub fn with_score(mut self, score: ScoreSpec) -> Self {
        self.score = score;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.mean_window == 0 {
            return Err(ParamsError::ZeroWindow {
                name: "mean_window",
            });
        }
        if self.vol_window == 0 {
            return Err(ParamsError::ZeroWindow { name: "vol_window" });
        }
        require_fraction("min_coverage", self.min_coverage)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rebalance Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Selects the base-weight driver at rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightDriver {
    /// Weight proportional to the composite score.
    #[default]
    Score,
    /// Weight proportional to the trailing EDR mean.
    EdrMean,
}

/// Parameters of the rebalance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceParams {
    /// Target constituent count (K).
    pub constituent_count: usize,
    /// Per-title weight cap after redistribution.
    pub weight_cap: f64,
    /// Hysteresis band: a prior constituent ranked within K + band stays in.
    pub hysteresis_band: usize,
    /// Base-weight driver.
    pub weight_driver: WeightDriver,
}

impl Default for RebalanceParams {
    fn default() -> Self {
        Self {
            constituent_count: 100,
            weight_cap: 0.10,
            hysteresis_band: 10,
            weight_driver: WeightDriver::Score,
        }
    }
}

impl RebalanceParams {
    /// Set the target constituent count.
    pub fn with_constituent_count(mut self, k: usize) -> Self {
        self.constituent_count = k;
        self
    }

    /// Set the per-title weight cap.
    pub fn with_weight_cap(mut self, cap: f64) -> Self {
        self.weight_cap = cap;
        self
    }

    /// Set the hysteresis band width.
    pub fn with_hysteresis_band(mut self, band: usize) -> Self {
        self.hysteresis_band = band;
        self
    }

    /// Select the base-weight driver.
    pub fn with_weight_driver(mut self, driver: WeightDriver) -> Self {
        self.weight_driver = driver;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.constituent_count == 0 {
            return Err(ParamsError::ZeroWindow {
                name: "constituent_count",
            });
        }
        require_positive("weight_cap", self.weight_cap)?;
        require_fraction("weight_cap", self.weight_cap)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Index Level Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters of the chain-linked level series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexLevelParams {
    /// Level published on the first date with defined membership.
    pub base_level: f64,
    /// Denominator guard for day-over-day EDR returns.
    pub eps: f64,
}

impl Default for IndexLevelParams {
    fn default() -> Self {
        Self {
            base_level: 1000.0,
            eps: 1.0,
        }
    }
}

impl IndexLevelParams {
    /// Set the base level.
    pub fn with_base_level(mut self, level: f64) -> Self {
        self.base_level = level;
        self
    }

    /// Set the return denominator guard.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        require_positive("base_level", self.base_level)?;
        require_positive("eps", self.eps)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Logical table and export locations. Purely a persistence concern; the
/// engine stages never see paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageParams {
    /// Root directory for the persisted index tables.
    pub index_data_dir: PathBuf,
    /// SQLite database file name inside `index_data_dir`.
    pub db_file: String,
    /// Exports subdirectory name inside `index_data_dir`.
    pub exports_dir: String,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            index_data_dir: PathBuf::from("index_data"),
            db_file: "rte_index.sqlite".to_string(),
            exports_dir: "exports".to_string(),
        }
    }
}

impl StorageParams {
    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_data_dir = dir.into();
        self
    }

    /// Full path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.index_data_dir.join(&self.db_file)
    }

    /// Root of the export tree.
    pub fn exports_root(&self) -> PathBuf {
        self.index_data_dir.join(&self.exports_dir)
    }

    /// Dated export directory for one rebalance.
    pub fn exports_day(&self, date: impl AsRef<Path>) -> PathBuf {
        self.exports_root().join(date)
    }
}
