//! Core types for the RTE index engine.
//!
//! This crate provides the shared data rows flowing between pipeline stages
//! (canonical records, snapshots, feature rows, membership, level points)
//! and the injected parameter structs for every stage.

pub mod features;
pub mod ids;
pub mod membership;
pub mod params;
pub mod record;
pub mod snapshot;

// Re-export main types at crate root for convenience
pub use features::FeatureRow;
pub use ids::{DayDate, UniverseId};
pub use membership::{IndexLevelPoint, MembershipRecord, RankedTitle};
pub use params::{
    EdrParams, IndexLevelParams, ParamsError, RebalanceParams, RollingParams, ScoreSpec,
    StorageParams, WeightDriver,
};
pub use record::{CatalogEntry, TitleRecord};
pub use snapshot::Snapshot;
