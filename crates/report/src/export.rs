//! Constituent and level-series export artifacts.
//!
//! The exporter merges one rebalance's membership with the ranked-universe
//! diagnostics and each title's latest as-of snapshot, then writes the
//! merged table as CSV and JSON: a dated copy under `exports/<date>/` and a
//! `_latest` copy at the exports root. The engine is agnostic to all of
//! this; only rows it already produced are combined here.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use types::{DayDate, IndexLevelPoint, MembershipRecord, RankedTitle, Snapshot, UniverseId};

use crate::error::{ReportError, Result};

/// One merged export row: membership, ranking diagnostics, and the latest
/// snapshot's operational columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub rebalance_date: DayDate,
    pub rank: u32,
    #[serde(rename = "universeId")]
    pub universe_id: u64,
    pub name: String,
    pub developer: String,
    pub weight: f64,
    pub score: Option<f64>,
    pub edr_7d_mean: Option<f64>,
    pub edr_mom: Option<f64>,
    pub edr_14d_vol: Option<f64>,
    pub coverage_7d: Option<f64>,
    pub avg_ccu: Option<f64>,
    pub visits: Option<f64>,
    pub monetization_count: Option<f64>,
    pub median_price: Option<f64>,
    pub engagement_score: Option<f64>,
    pub edr_raw: Option<f64>,
}

/// Merge membership, ranked diagnostics, and latest snapshots into export
/// rows, ordered by rank.
pub fn build_export_rows(
    membership: &[MembershipRecord],
    ranked: &[RankedTitle],
    latest_snapshots: &[Snapshot],
) -> Vec<ExportRow> {
    let by_rank = {
        let mut rows: Vec<&MembershipRecord> = membership.iter().collect();
        rows.sort_by_key(|m| m.rank);
        rows
    };
    let ranked_by_id: HashMap<UniverseId, &RankedTitle> =
        ranked.iter().map(|r| (r.universe_id, r)).collect();
    let snap_by_id: HashMap<UniverseId, &Snapshot> = latest_snapshots
        .iter()
        .map(|s| (s.universe_id, s))
        .collect();

    by_rank
        .into_iter()
        .map(|member| {
            let diag = ranked_by_id.get(&member.universe_id);
            let snap = snap_by_id.get(&member.universe_id);
            ExportRow {
                rebalance_date: member.rebalance_date,
                rank: member.rank,
                universe_id: member.universe_id.0,
                name: snap.map(|s| s.name.clone()).unwrap_or_default(),
                developer: snap.map(|s| s.developer.clone()).unwrap_or_default(),
                weight: member.weight,
                score: diag.map(|d| d.score),
                edr_7d_mean: diag.map(|d| d.edr_7d_mean),
                edr_mom: diag.and_then(|d| d.edr_mom),
                edr_14d_vol: diag.and_then(|d| d.edr_14d_vol),
                coverage_7d: diag.map(|d| d.coverage_7d),
                avg_ccu: snap.map(|s| s.avg_ccu),
                visits: snap.map(|s| s.visits),
                monetization_count: snap.map(|s| s.monetization_count),
                median_price: snap.map(|s| s.median_price),
                engagement_score: snap.map(|s| s.engagement_score),
                edr_raw: snap.map(|s| s.edr_raw),
            }
        })
        .collect()
}

/// Write the constituent table as dated CSV + JSON plus `_latest` copies.
pub fn export_constituents(
    rows: &[ExportRow],
    exports_root: &Path,
    exports_day: &Path,
) -> Result<()> {
    ensure_dir(exports_root)?;
    ensure_dir(exports_day)?;

    let dated_csv = exports_day.join("rte100.csv");
    let dated_json = exports_day.join("rte100.json");
    write_csv(rows, &dated_csv)?;
    write_json(rows, &dated_json)?;
    copy_artifact(&dated_csv, &exports_root.join("rte100_latest.csv"))?;
    copy_artifact(&dated_json, &exports_root.join("rte100_latest.json"))?;

    info!(csv = %dated_csv.display(), json = %dated_json.display(), "exported constituents");
    Ok(())
}

/// Write the index level series as CSV into one export directory.
pub fn export_index_levels(levels: &[IndexLevelPoint], exports_day: &Path) -> Result<PathBuf> {
    ensure_dir(exports_day)?;
    let path = exports_day.join("index_levels.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    for point in levels {
        writer.serialize(point)?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn write_csv(rows: &[ExportRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json(rows: &[ExportRow], path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(rows)?;
    fs::write(path, body).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_artifact(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|source| ReportError::Io {
            path: dst.to_path_buf(),
            source,
        })
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> DayDate {
        DayDate::from_ymd_opt(2026, 2, 6).unwrap()
    }

    fn member(id: u64, rank: u32, weight: f64) -> MembershipRecord {
        MembershipRecord {
            rebalance_date: date(),
            universe_id: UniverseId(id),
            rank,
            weight,
        }
    }

    fn ranked(id: u64, score: f64) -> RankedTitle {
        RankedTitle {
            rebalance_date: date(),
            universe_id: UniverseId(id),
            score,
            edr_7d_mean: score,
            edr_mom: Some(0.05),
            edr_14d_vol: None,
            coverage_7d: 1.0,
        }
    }

    fn snap(id: u64, name: &str) -> Snapshot {
        Snapshot {
            universe_id: UniverseId(id),
            snapshot_date: date(),
            name: name.to_string(),
            developer: "Studio".to_string(),
            avg_ccu: 10.0,
            visits: 100.0,
            favorites: 1.0,
            likes: 1.0,
            monetization_count: 3.0,
            median_price: 25.0,
            price_dispersion: 0.0,
            engagement_score: 0.5,
            dau_est: 200.0,
            pcr: 0.01,
            aspu: 25.0,
            spend_revenue: 50.0,
            premium_revenue: 2.0,
            edr_raw: 52.0,
        }
    }

    #[test]
    fn test_rows_merged_and_rank_ordered() {
        let membership = vec![member(2, 2, 0.4), member(1, 1, 0.6)];
        let ranked_rows = vec![ranked(1, 100.0), ranked(2, 80.0), ranked(3, 10.0)];
        let snapshots = vec![snap(1, "Alpha"), snap(2, "Beta")];

        let rows = build_export_rows(&membership, &ranked_rows, &snapshots);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].name, "Alpha");
        assert_eq!(rows[0].score, Some(100.0));
        assert_eq!(rows[1].universe_id, 2);
        assert_eq!(rows[1].weight, 0.4);
    }

    #[test]
    fn test_missing_snapshot_leaves_blanks() {
        let membership = vec![member(9, 1, 1.0)];
        let rows = build_export_rows(&membership, &[], &[]);
        assert_eq!(rows[0].name, "");
        assert_eq!(rows[0].edr_raw, None);
        assert_eq!(rows[0].score, None);
    }

    #[test]
    fn test_export_writes_dated_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("exports");
        let day = root.join("2026-02-06");

        let membership = vec![member(1, 1, 1.0)];
        let rows = build_export_rows(&membership, &[ranked(1, 10.0)], &[snap(1, "Alpha")]);
        export_constituents(&rows, &root, &day).unwrap();

        assert!(day.join("rte100.csv").is_file());
        assert!(day.join("rte100.json").is_file());
        assert!(root.join("rte100_latest.csv").is_file());
        assert!(root.join("rte100_latest.json").is_file());

        let csv_body = std::fs::read_to_string(day.join("rte100.csv")).unwrap();
        assert!(csv_body.starts_with("rebalance_date,rank,universeId,"));
        assert!(csv_body.contains("Alpha"));
    }

    #[test]
    fn test_index_levels_csv() {
        let dir = tempfile::tempdir().unwrap();
        let levels = vec![
            IndexLevelPoint {
                date: date(),
                level: 1000.0,
            },
            IndexLevelPoint {
                date: date().succ_opt().unwrap(),
                level: 1020.0,
            },
        ];
        let path = export_index_levels(&levels, dir.path()).unwrap();
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.contains("2026-02-06"));
        assert!(body.contains("1020.0"));
    }
}
