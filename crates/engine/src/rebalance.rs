//! Rebalance engine: feature table in, ranked universe and membership out.
//!
//! Selection is deterministic: ordering ties break on ascending universe id
//! so identical inputs rerun to byte-identical output. Weight invariants are
//! programming errors and assert before anything reaches an exporter.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;
use types::{
    DayDate, FeatureRow, MembershipRecord, RankedTitle, RebalanceParams, UniverseId, WeightDriver,
};

use crate::error::Result;

/// Weight-sum tolerance for the membership invariant.
const WEIGHT_SUM_TOL: f64 = 1e-9;

/// Output of one rebalance: diagnostics for every eligible title plus the
/// selected membership.
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceResult {
    /// All eligible titles in score order, selected or not.
    pub ranked: Vec<RankedTitle>,
    /// Selected constituents with dense ranks and normalized weights.
    pub membership: Vec<MembershipRecord>,
}

/// Run one rebalance over the feature table as of `rebalance_date`.
///
/// `prior_membership` may span the whole membership history; only the most
/// recent rebalance in it participates in hysteresis. `min_coverage` is the
/// rolling eligibility gate: a title below it is excluded regardless of
/// score.
///
/// Degenerate inputs are defined, not errors: fewer eligible titles than K
/// selects them all, an empty universe produces an empty membership, and a
/// first run (no prior membership) is a pure ranking selection.
pub fn rebalance(
    features: &[FeatureRow],
    rebalance_date: DayDate,
    prior_membership: &[MembershipRecord],
    params: &RebalanceParams,
    min_coverage: f64,
) -> Result<RebalanceResult> {
    params.validate()?;

    let mut eligible: Vec<&FeatureRow> = features
        .iter()
        .filter(|row| row.coverage_7d >= min_coverage)
        .collect();
    eligible.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.universe_id.cmp(&b.universe_id))
    });

    let ranked: Vec<RankedTitle> = eligible
        .iter()
        .map(|row| RankedTitle {
            rebalance_date,
            universe_id: row.universe_id,
            score: row.score,
            edr_7d_mean: row.edr_7d_mean,
            edr_mom: row.edr_mom,
            edr_14d_vol: row.edr_14d_vol,
            coverage_7d: row.coverage_7d,
        })
        .collect();

    let prior_ids = latest_membership_ids(prior_membership);
    let selected = select(&eligible, &prior_ids, params);
    debug!(
        eligible = eligible.len(),
        selected = selected.len(),
        incumbents = prior_ids.len(),
        "rebalance selection complete"
    );

    let drivers: Vec<f64> = selected
        .iter()
        .map(|i| match params.weight_driver {
            WeightDriver::Score => eligible[*i].score,
            WeightDriver::EdrMean => eligible[*i].edr_7d_mean,
        })
        .collect();
    let weights = compute_weights(&drivers, params.weight_cap);

    let membership: Vec<MembershipRecord> = selected
        .iter()
        .zip(weights)
        .enumerate()
        .map(|(rank0, (i, weight))| MembershipRecord {
            rebalance_date,
            universe_id: eligible[*i].universe_id,
            rank: rank0 as u32 + 1,
            weight,
        })
        .collect();
    validate_membership(&membership, params);

    Ok(RebalanceResult { ranked, membership })
}

/// Constituent ids of the most recent rebalance within a membership history.
fn latest_membership_ids(membership: &[MembershipRecord]) -> BTreeSet<UniverseId> {
    let latest = match membership.iter().map(|m| m.rebalance_date).max() {
        Some(date) => date,
        None => return BTreeSet::new(),
    };
    membership
        .iter()
        .filter(|m| m.rebalance_date == latest)
        .map(|m| m.universe_id)
        .collect()
}

/// Choose the constituents, as indices into the score-ordered eligible list.
///
/// Turnover damping: an incumbent whose score-order position is within
/// K + hysteresis_band keeps its seat ahead of any strictly higher-scored
/// challenger; the seats left over are filled in score order. Ranks are
/// always re-assigned over the final selection in score order.
fn select(
    eligible: &[&FeatureRow],
    prior_ids: &BTreeSet<UniverseId>,
    params: &RebalanceParams,
) -> Vec<usize> {
    let k = params.constituent_count;
    if eligible.len() <= k {
        return (0..eligible.len()).collect();
    }
    if prior_ids.is_empty() {
        return (0..k).collect();
    }

    let band_limit = k + params.hysteresis_band;
    let mut selected: Vec<usize> = (0..eligible.len().min(band_limit))
        .filter(|i| prior_ids.contains(&eligible[*i].universe_id))
        .collect();
    selected.truncate(k);

    for i in 0..eligible.len() {
        if selected.len() >= k {
            break;
        }
        if !selected.contains(&i) {
            selected.push(i);
        }
    }
    selected.sort_unstable();
    selected
}

/// Turn driver values into normalized, capped weights summing to one.
///
/// Base weights are proportional to the (non-negative) driver. Weights above
/// the cap are pinned there and the excess rescales the uncapped remainder,
/// iterating to a fixed point since one pass can push new titles over the
/// cap. When the cap is infeasible (n·cap < 1) the defined fallback is
/// equal weights.
fn compute_weights(drivers: &[f64], cap: f64) -> Vec<f64> {
    let n = drivers.len();
    if n == 0 {
        return Vec::new();
    }
    let equal = vec![1.0 / n as f64; n];
    if (n as f64) * cap < 1.0 {
        return equal;
    }

    let clipped: Vec<f64> = drivers.iter().map(|d| d.max(0.0)).collect();
    let total: f64 = clipped.iter().sum();
    if total <= 0.0 {
        return equal;
    }

    let mut weights: Vec<f64> = clipped.iter().map(|d| d / total).collect();
    let mut capped = vec![false; n];
    loop {
        let mut newly_capped = false;
        for i in 0..n {
            if !capped[i] && weights[i] > cap + WEIGHT_SUM_TOL {
                weights[i] = cap;
                capped[i] = true;
                newly_capped = true;
            }
        }
        if !newly_capped {
            break;
        }

        let capped_mass: f64 = capped.iter().filter(|c| **c).count() as f64 * cap;
        let remaining = (1.0 - capped_mass).max(0.0);
        let free: Vec<usize> = (0..n).filter(|i| !capped[*i]).collect();
        if free.is_empty() {
            break;
        }
        let free_sum: f64 = free.iter().map(|i| weights[*i]).sum();
        if free_sum > 0.0 {
            for i in &free {
                weights[*i] *= remaining / free_sum;
            }
        } else {
            for i in &free {
                weights[*i] = remaining / free.len() as f64;
            }
        }
    }

    // Exact renormalization after cap/redistribution.
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        for w in &mut weights {
            *w /= sum;
        }
    }
    weights
}

/// Membership invariants are programming errors: fail loudly here rather
/// than export a malformed index.
fn validate_membership(membership: &[MembershipRecord], params: &RebalanceParams) {
    if membership.is_empty() {
        return;
    }
    for (i, record) in membership.iter().enumerate() {
        assert_eq!(
            record.rank,
            i as u32 + 1,
            "membership ranks must be dense 1..n"
        );
    }
    assert!(
        membership.len() <= params.constituent_count,
        "membership exceeds constituent count"
    );

    let sum: f64 = membership.iter().map(|m| m.weight).sum();
    assert!(
        (sum - 1.0).abs() <= WEIGHT_SUM_TOL,
        "membership weights sum to {sum}, expected 1"
    );

    let cap_feasible = membership.len() as f64 * params.weight_cap >= 1.0;
    if cap_feasible {
        for record in membership {
            assert!(
                record.weight <= params.weight_cap + WEIGHT_SUM_TOL,
                "weight {} exceeds cap {}",
                record.weight,
                params.weight_cap
            );
        }
    }
}
