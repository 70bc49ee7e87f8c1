//! Core identifier types for the index engine.
//!
//! This module defines the fundamental ID and time types used throughout the
//! system to identify titles and date snapshots.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a game title (its universe).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct UniverseId(pub u64);

impl fmt::Display for UniverseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Universe#{}", self.0)
    }
}

/// Calendar date of a daily snapshot or rebalance.
///
/// The pipeline operates on a daily cadence; all trailing windows are
/// calendar-day windows over this type.
pub type DayDate = chrono::NaiveDate;
