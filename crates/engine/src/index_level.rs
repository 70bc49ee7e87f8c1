//! Chain-linked daily index level series.
//!
//! The level starts at the base level on the first date with defined
//! membership and compounds the weight-weighted average of constituent
//! day-over-day EDR returns. Weights from a rebalance apply from that date
//! forward; prior levels are never recomputed.

use std::collections::BTreeMap;

use tracing::warn;
use types::{DayDate, IndexLevelParams, IndexLevelPoint, MembershipRecord, UniverseId};

use crate::error::Result;
use crate::features::SnapshotHistory;

/// Build the daily level series from the full snapshot and membership
/// histories.
///
/// Each constituent's return on date `t` is
/// `(edr_t - edr_prev) / max(edr_prev, eps)`; a title missing either
/// observation is excluded from that day and the remaining weights are
/// renormalized, so one gap never corrupts the day. A day with no observed
/// constituents (including a zero-constituent rebalance period) holds the
/// level flat.
pub fn build_index_levels(
    history: &SnapshotHistory,
    membership_history: &[MembershipRecord],
    params: &IndexLevelParams,
) -> Result<Vec<IndexLevelPoint>> {
    params.validate()?;

    let weights_by_date = group_by_rebalance(membership_history);
    let first_date = match weights_by_date.keys().next() {
        Some(date) => *date,
        None => return Ok(Vec::new()),
    };
    let last_date = history
        .latest_date()
        .into_iter()
        .chain(weights_by_date.keys().next_back().copied())
        .max()
        .unwrap_or(first_date);

    let mut series = Vec::new();
    let mut level = params.base_level;
    let mut date = first_date;
    series.push(IndexLevelPoint {
        date,
        level,
    });

    while date < last_date {
        let next = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
        // Weights in force: the latest rebalance at or before this date.
        let weights = weights_by_date
            .range(..=next)
            .next_back()
            .map(|(_, w)| w.as_slice())
            .unwrap_or(&[]);

        let ret = weighted_return(history, weights, next, params.eps);
        level *= 1.0 + ret;
        series.push(IndexLevelPoint { date: next, level });
        date = next;
    }
    Ok(series)
}

/// Membership grouped by rebalance date, ascending.
fn group_by_rebalance(
    membership: &[MembershipRecord],
) -> BTreeMap<DayDate, Vec<(UniverseId, f64)>> {
    let mut grouped: BTreeMap<DayDate, Vec<(UniverseId, f64)>> = BTreeMap::new();
    for record in membership {
        grouped
            .entry(record.rebalance_date)
            .or_default()
            .push((record.universe_id, record.weight));
    }
    grouped
}

/// Weight-weighted average EDR return over the constituents observed on
/// both `date` and the preceding day.
fn weighted_return(
    history: &SnapshotHistory,
    weights: &[(UniverseId, f64)],
    date: DayDate,
    eps: f64,
) -> f64 {
    let prev_date = match date.pred_opt() {
        Some(prev) => prev,
        None => return 0.0,
    };

    let mut weighted_sum = 0.0;
    let mut observed_weight = 0.0;
    for (universe_id, weight) in weights {
        let today = history.get(*universe_id, date);
        let yesterday = history.get(*universe_id, prev_date);
        if let (Some(today), Some(yesterday)) = (today, yesterday) {
            let ret = (today.edr_raw - yesterday.edr_raw) / yesterday.edr_raw.max(eps);
            weighted_sum += weight * ret;
            observed_weight += weight;
        }
    }

    if observed_weight > 0.0 {
        weighted_sum / observed_weight
    } else {
        if !weights.is_empty() {
            warn!(%date, "no constituent observed on both days; holding level flat");
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::Snapshot;

    fn date(day: u32) -> DayDate {
        DayDate::from_ymd_opt(2026, 4, day).unwrap()
    }

    fn snapshot(id: u64, day: u32, edr: f64) -> Snapshot {
        Snapshot {
            universe_id: UniverseId(id),
            snapshot_date: date(day),
            name: String::new(),
            developer: String::new(),
            avg_ccu: 0.0,
            visits: 0.0,
            favorites: 0.0,
            likes: 0.0,
            monetization_count: 0.0,
            median_price: 0.0,
            price_dispersion: 0.0,
            engagement_score: 0.0,
            dau_est: 0.0,
            pcr: 0.001,
            aspu: 0.0,
            spend_revenue: 0.0,
            premium_revenue: 0.0,
            edr_raw: edr,
        }
    }

    fn member(id: u64, day: u32, rank: u32, weight: f64) -> MembershipRecord {
        MembershipRecord {
            rebalance_date: date(day),
            universe_id: UniverseId(id),
            rank,
            weight,
        }
    }

    #[test]
    fn test_two_percent_day_compounds_from_base() {
        // Single constituent moving +2% day over day.
        let history =
            SnapshotHistory::from_snapshots([snapshot(1, 10, 1000.0), snapshot(1, 11, 1020.0)]);
        let membership = vec![member(1, 10, 1, 1.0)];

        let series =
            build_index_levels(&history, &membership, &IndexLevelParams::default()).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, date(10));
        assert_eq!(series[0].level, 1000.0);
        assert!((series[1].level - 1020.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_observation_renormalizes() {
        // Two equal-weight constituents; title 2 is missing on day 11, so
        // the day's return is title 1's alone.
        let history = SnapshotHistory::from_snapshots([
            snapshot(1, 10, 100.0),
            snapshot(1, 11, 110.0),
            snapshot(2, 10, 100.0),
        ]);
        let membership = vec![member(1, 10, 1, 0.5), member(2, 10, 2, 0.5)];

        let series =
            build_index_levels(&history, &membership, &IndexLevelParams::default()).unwrap();

        assert!((series[1].level - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_membership_produces_empty_series() {
        let history = SnapshotHistory::from_snapshots([snapshot(1, 10, 100.0)]);
        let series =
            build_index_levels(&history, &[], &IndexLevelParams::default()).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_zero_constituent_period_holds_flat() {
        let history = SnapshotHistory::from_snapshots([
            snapshot(1, 10, 100.0),
            snapshot(1, 11, 200.0),
            snapshot(1, 12, 300.0),
        ]);
        // A rebalance exists but selected nothing: levels stay at base.
        let membership: Vec<MembershipRecord> = Vec::new();
        let series =
            build_index_levels(&history, &membership, &IndexLevelParams::default()).unwrap();
        assert!(series.is_empty());

        // With a real first rebalance and an empty follow-up period the
        // series is flat after the constituent drops out of the data.
        let membership = vec![member(9, 10, 1, 1.0)];
        let series =
            build_index_levels(&history, &membership, &IndexLevelParams::default()).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|p| p.level == 1000.0));
    }

    #[test]
    fn test_new_weights_apply_strictly_forward() {
        // Title 1 rallies, title 2 flat. First period is 100% title 2; the
        // day-12 rebalance moves to 100% title 1 and governs day 12 onward
        // (weights in force = last set at or before the date).
        let history = SnapshotHistory::from_snapshots([
            snapshot(1, 10, 100.0),
            snapshot(1, 11, 150.0),
            snapshot(1, 12, 300.0),
            snapshot(2, 10, 100.0),
            snapshot(2, 11, 100.0),
            snapshot(2, 12, 100.0),
        ]);
        let membership = vec![member(2, 10, 1, 1.0), member(1, 12, 1, 1.0)];

        let series =
            build_index_levels(&history, &membership, &IndexLevelParams::default()).unwrap();

        // Day 11 accrues under the old weights (title 2, flat); day 12
        // accrues under the new ones (+100% on title 1). Day 11's level is
        // never recomputed.
        assert_eq!(series[0].level, 1000.0);
        assert!((series[1].level - 1000.0).abs() < 1e-9);
        assert!((series[2].level - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_eps_guards_tiny_denominator() {
        // EDR 0 → 5 with eps=1: return = 5/1, not infinity.
        let history =
            SnapshotHistory::from_snapshots([snapshot(1, 10, 0.0), snapshot(1, 11, 5.0)]);
        let membership = vec![member(1, 10, 1, 1.0)];

        let series =
            build_index_levels(&history, &membership, &IndexLevelParams::default()).unwrap();
        assert!((series[1].level - 6000.0).abs() < 1e-9);
        assert!(series[1].level.is_finite());
    }
}
