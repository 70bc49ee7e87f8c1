//! Enriched daily snapshot rows.

use serde::{Deserialize, Serialize};

use crate::{DayDate, UniverseId};

/// One title's enriched snapshot for one day: the raw operational signals
/// plus every EDR intermediate and the EDR estimate itself.
///
/// One row per (title, day); recomputing a day fully replaces the prior row
/// for the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub universe_id: UniverseId,
    pub snapshot_date: DayDate,
    pub name: String,
    pub developer: String,

    /// Average concurrent players, resolved from the first available source
    /// field. Never negative.
    pub avg_ccu: f64,
    pub visits: f64,
    pub favorites: f64,
    pub likes: f64,

    /// Number of purchasable catalog items (passes + products).
    pub monetization_count: f64,
    /// Median catalog price; 0 for an empty catalog.
    pub median_price: f64,
    /// Population coefficient of variation of catalog prices; 0 when the
    /// catalog is empty or its mean price is non-positive.
    pub price_dispersion: f64,

    /// Clipped engagement composite in [0, engagement_cap].
    pub engagement_score: f64,
    /// Estimated daily active users.
    pub dau_est: f64,
    /// Purchase conversion rate proxy in [pcr_floor, pcr_cap].
    pub pcr: f64,
    /// Average spend per user proxy.
    pub aspu: f64,

    pub spend_revenue: f64,
    pub premium_revenue: f64,
    /// Estimated daily revenue; never negative.
    pub edr_raw: f64,
}

impl Snapshot {
    /// Key identifying this row in the snapshot table.
    #[inline]
    pub fn key(&self) -> (UniverseId, DayDate) {
        (self.universe_id, self.snapshot_date)
    }
}
