//! Core stages of the RTE index engine.
//!
//! Four linked, deterministic, side-effect-free transforms:
//!
//! - [`edr`] - row-wise EDR estimation over one day's canonical records
//! - [`features`] - rolling trailing-window features over snapshot history
//! - [`rebalance`] - eligibility, ranking, selection, and capped weighting
//! - [`index_level`] - chain-linked daily level series
//!
//! No stage performs I/O; each consumes explicitly passed inputs and is
//! recomputed from the full persisted history every run (rebuild-on-read).

pub mod edr;
pub mod error;
pub mod features;
pub mod index_level;
pub mod rebalance;

pub use edr::estimate_day;
pub use error::{EngineError, Result};
pub use features::SnapshotHistory;
pub use index_level::build_index_levels;
pub use rebalance::{rebalance, RebalanceResult};
