//! Index membership, ranked-universe diagnostics, and level series rows.

use serde::{Deserialize, Serialize};

use crate::{DayDate, UniverseId};

/// One constituent of the index as of one rebalance date.
///
/// Ranks are a dense 1..n sequence per rebalance date and weights sum to 1
/// per rebalance date. Membership history is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub rebalance_date: DayDate,
    pub universe_id: UniverseId,
    pub rank: u32,
    pub weight: f64,
}

/// Diagnostics row for one eligible title at a rebalance, selected or not.
///
/// The ranked universe is ordered by score (descending) and carries the
/// feature inputs so exporters can explain the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTitle {
    pub rebalance_date: DayDate,
    pub universe_id: UniverseId,
    pub score: f64,
    pub edr_7d_mean: f64,
    pub edr_mom: Option<f64>,
    pub edr_14d_vol: Option<f64>,
    pub coverage_7d: f64,
}

/// One point of the chain-linked daily index level series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexLevelPoint {
    pub date: DayDate,
    pub level: f64,
}
