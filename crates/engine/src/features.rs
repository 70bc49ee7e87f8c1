//! Rolling feature aggregation over the snapshot history.
//!
//! [`SnapshotHistory`] holds the deduplicated (title, day) history and can
//! produce the per-title trailing-window feature table as of any date
//! without reprocessing the rest of the pipeline; rebalances and backtests
//! both go through `features_as_of`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Days;
use quant::{create_score, stats, ScoreInputs};
use types::{DayDate, FeatureRow, RollingParams, Snapshot, UniverseId};

use crate::error::Result;

/// Deduplicated snapshot history keyed by (title, day).
///
/// Inserting a snapshot for an existing key replaces the prior row, which is
/// exactly the recomputation contract: a re-ingested day fully supersedes
/// what was there before.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHistory {
    by_title: BTreeMap<UniverseId, BTreeMap<DayDate, Snapshot>>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from any snapshot iterator; later duplicates win.
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        let mut history = Self::new();
        for snapshot in snapshots {
            history.insert(snapshot);
        }
        history
    }

    /// Insert one snapshot, replacing any prior row for the same key.
    pub fn insert(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.by_title
            .entry(snapshot.universe_id)
            .or_default()
            .insert(snapshot.snapshot_date, snapshot)
    }

    /// Number of distinct titles.
    pub fn title_count(&self) -> usize {
        self.by_title.len()
    }

    /// Total number of (title, day) rows.
    pub fn len(&self) -> usize {
        self.by_title.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }

    /// Look up one title's snapshot for one day.
    pub fn get(&self, universe_id: UniverseId, date: DayDate) -> Option<&Snapshot> {
        self.by_title.get(&universe_id)?.get(&date)
    }

    /// All distinct snapshot dates, ascending.
    pub fn dates(&self) -> BTreeSet<DayDate> {
        self.by_title
            .values()
            .flat_map(|days| days.keys().copied())
            .collect()
    }

    /// Most recent snapshot date across all titles.
    pub fn latest_date(&self) -> Option<DayDate> {
        self.by_title
            .values()
            .filter_map(|days| days.keys().next_back())
            .max()
            .copied()
    }

    /// Latest snapshot at or before `as_of` for each title.
    pub fn latest_per_title(&self, as_of: DayDate) -> Vec<&Snapshot> {
        self.by_title
            .values()
            .filter_map(|days| days.range(..=as_of).next_back().map(|(_, snap)| snap))
            .collect()
    }

    /// Compute the per-title feature table as of one date.
    ///
    /// Titles with no observation in the trailing mean window are omitted:
    /// an absent title is not a zero-EDR title.
    pub fn features_as_of(&self, as_of: DayDate, params: &RollingParams) -> Result<Vec<FeatureRow>> {
        params.validate()?;
        let score_fn = create_score(params.score);
        let mean_window = params.mean_window as u64;
        let vol_window = params.vol_window as u64;

        let mut rows = Vec::new();
        for (universe_id, days) in &self.by_title {
            let current = window_values(days, window_start(as_of, mean_window), as_of);
            if current.is_empty() {
                continue;
            }

            let edr_7d_mean = stats::mean(&current).unwrap_or(0.0);
            let coverage_7d = current.len() as f64 / mean_window as f64;

            let prior_end = window_start(as_of, mean_window)
                .pred_opt()
                .unwrap_or(DayDate::MIN);
            let prior = window_values(days, window_start(prior_end, mean_window), prior_end);
            let prior_mean = stats::mean(&prior).unwrap_or(0.0);
            let edr_mom = momentum(edr_7d_mean, prior_mean);

            let vol_values = window_values(days, window_start(as_of, vol_window), as_of);
            let edr_14d_vol = stats::sample_std_dev(&vol_values);

            let score = score_fn.score(&ScoreInputs {
                edr_mean: edr_7d_mean,
                coverage: coverage_7d,
                vol: edr_14d_vol,
            });

            rows.push(FeatureRow {
                universe_id: *universe_id,
                as_of_date: as_of,
                edr_7d_mean,
                edr_mom,
                edr_14d_vol,
                coverage_7d,
                score,
            });
        }
        Ok(rows)
    }

    /// Full feature-table rebuild: features as of every distinct snapshot
    /// date. This is the persisted table; rebalances use one slice of it.
    pub fn feature_table(&self, params: &RollingParams) -> Result<Vec<FeatureRow>> {
        let mut rows = Vec::new();
        for date in self.dates() {
            rows.extend(self.features_as_of(date, params)?);
        }
        Ok(rows)
    }
}

/// First day of a trailing window of `length` days ending at `end`.
fn window_start(end: DayDate, length: u64) -> DayDate {
    end.checked_sub_days(Days::new(length.saturating_sub(1)))
        .unwrap_or(DayDate::MIN)
}

/// EDR values observed in [start, end], oldest first.
fn window_values(days: &BTreeMap<DayDate, Snapshot>, start: DayDate, end: DayDate) -> Vec<f64> {
    days.range(start..=end)
        .map(|(_, snap)| snap.edr_raw)
        .collect()
}

/// Window-over-window momentum of the trailing mean.
///
/// An empty prior window counts as a zero prior mean. Both windows zero is a
/// true zero change; a zero prior with a non-zero current is an undefined
/// ratio and stays missing.
fn momentum(current_mean: f64, prior_mean: f64) -> Option<f64> {
    if prior_mean == 0.0 {
        if current_mean == 0.0 {
            Some(0.0)
        } else {
            None
        }
    } else {
        Some(current_mean / prior_mean - 1.0)
    }
}
