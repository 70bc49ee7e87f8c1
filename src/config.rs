//! Central configuration for the index pipeline.
//!
//! All stage parameters are assembled here for easy tuning; the CLI only
//! overrides individual fields.

use std::path::PathBuf;

use types::{
    EdrParams, IndexLevelParams, ParamsError, RebalanceParams, RollingParams, StorageParams,
};

/// Master configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding raw per-day runs (`runs/<YYYY-MM-DD>/pruned/`).
    pub runs_dir: PathBuf,

    /// EDR model parameters.
    pub edr: EdrParams,
    /// Rolling feature windows and eligibility gate.
    pub rolling: RollingParams,
    /// Selection and weighting parameters.
    pub rebalance: RebalanceParams,
    /// Chain-linking parameters.
    pub index_level: IndexLevelParams,
    /// Persisted table and export locations.
    pub storage: StorageParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            runs_dir: PathBuf::from("runs"),
            edr: EdrParams::default(),
            rolling: RollingParams::default(),
            rebalance: RebalanceParams::default(),
            index_level: IndexLevelParams::default(),
            storage: StorageParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the raw runs directory.
    pub fn with_runs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.runs_dir = dir.into();
        self
    }

    /// Set the persisted data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage = self.storage.with_data_dir(dir);
        self
    }

    /// Validate every stage's parameters up front.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.edr.validate()?;
        self.rolling.validate()?;
        self.rebalance.validate()?;
        self.index_level.validate()
    }
}
