//! Persisted index tables.
//!
//! The store owns the SQLite connection and enforces each table's write
//! semantics: snapshots replace by day, features rebuild wholesale,
//! membership appends by rebalance date, index levels replace wholesale.
//! No business logic lives here.

use std::path::Path;

use rusqlite::{params, Connection};
use tracing::info;
use types::{DayDate, FeatureRow, IndexLevelPoint, MembershipRecord, Snapshot, UniverseId};

use crate::error::{Result, StorageError};
use crate::schema::init_schema;

/// Handle over the persisted index tables.
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Open (or create) the database at `path`, creating parent directories
    /// and the schema as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        info!(path = %path.display(), "opened index store");
        Ok(Self { conn })
    }

    /// In-memory store for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Snapshots (replace by day)
    // ─────────────────────────────────────────────────────────────────────

    /// Replace all snapshot rows for one day.
    pub fn replace_day_snapshots(&mut self, date: DayDate, snapshots: &[Snapshot]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM snapshots WHERE snapshot_date = ?1",
            params![date.to_string()],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO snapshots (
                    universe_id, snapshot_date, name, developer,
                    avg_ccu, visits, favorites, likes,
                    monetization_count, median_price, price_dispersion,
                    engagement_score, dau_est, pcr, aspu,
                    spend_revenue, premium_revenue, edr_raw
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                          ?13, ?14, ?15, ?16, ?17, ?18)",
            )?;
            for snap in snapshots {
                stmt.execute(params![
                    snap.universe_id.0 as i64,
                    snap.snapshot_date.to_string(),
                    snap.name,
                    snap.developer,
                    snap.avg_ccu,
                    snap.visits,
                    snap.favorites,
                    snap.likes,
                    snap.monetization_count,
                    snap.median_price,
                    snap.price_dispersion,
                    snap.engagement_score,
                    snap.dau_est,
                    snap.pcr,
                    snap.aspu,
                    snap.spend_revenue,
                    snap.premium_revenue,
                    snap.edr_raw,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the full snapshot history, ordered by (universe, date).
    pub fn load_snapshots(&self) -> Result<Vec<Snapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT universe_id, snapshot_date, name, developer,
                    avg_ccu, visits, favorites, likes,
                    monetization_count, median_price, price_dispersion,
                    engagement_score, dau_est, pcr, aspu,
                    spend_revenue, premium_revenue, edr_raw
             FROM snapshots ORDER BY universe_id, snapshot_date",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Snapshot {
                universe_id: UniverseId(row.get::<_, i64>(0)? as u64),
                snapshot_date: get_date(row, 1)?,
                name: row.get(2)?,
                developer: row.get(3)?,
                avg_ccu: row.get(4)?,
                visits: row.get(5)?,
                favorites: row.get(6)?,
                likes: row.get(7)?,
                monetization_count: row.get(8)?,
                median_price: row.get(9)?,
                price_dispersion: row.get(10)?,
                engagement_score: row.get(11)?,
                dau_est: row.get(12)?,
                pcr: row.get(13)?,
                aspu: row.get(14)?,
                spend_revenue: row.get(15)?,
                premium_revenue: row.get(16)?,
                edr_raw: row.get(17)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Features (full rebuild)
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the whole feature table.
    pub fn rewrite_features(&mut self, features: &[FeatureRow]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM features", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO features (
                    universe_id, as_of_date, edr_7d_mean, edr_mom,
                    edr_14d_vol, coverage_7d, score
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in features {
                stmt.execute(params![
                    row.universe_id.0 as i64,
                    row.as_of_date.to_string(),
                    row.edr_7d_mean,
                    row.edr_mom,
                    row.edr_14d_vol,
                    row.coverage_7d,
                    row.score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the feature table slice for one as-of date.
    pub fn load_features_as_of(&self, as_of: DayDate) -> Result<Vec<FeatureRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT universe_id, as_of_date, edr_7d_mean, edr_mom,
                    edr_14d_vol, coverage_7d, score
             FROM features WHERE as_of_date = ?1 ORDER BY universe_id",
        )?;
        let rows = stmt.query_map(params![as_of.to_string()], |row| {
            Ok(FeatureRow {
                universe_id: UniverseId(row.get::<_, i64>(0)? as u64),
                as_of_date: get_date(row, 1)?,
                edr_7d_mean: row.get(2)?,
                edr_mom: row.get(3)?,
                edr_14d_vol: row.get(4)?,
                coverage_7d: row.get(5)?,
                score: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Membership (append-only)
    // ─────────────────────────────────────────────────────────────────────

    /// Append one rebalance's membership. Re-running the same rebalance
    /// replaces that date's rows rather than duplicating them.
    pub fn append_membership(&mut self, membership: &[MembershipRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO membership (rebalance_date, universe_id, rank, weight)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in membership {
                stmt.execute(params![
                    record.rebalance_date.to_string(),
                    record.universe_id.0 as i64,
                    record.rank,
                    record.weight,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the full membership history, ordered by (date, rank).
    pub fn load_membership(&self) -> Result<Vec<MembershipRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT rebalance_date, universe_id, rank, weight
             FROM membership ORDER BY rebalance_date, rank",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(MembershipRecord {
                rebalance_date: get_date(row, 0)?,
                universe_id: UniverseId(row.get::<_, i64>(1)? as u64),
                rank: row.get(2)?,
                weight: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Index levels (replace)
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the whole level series.
    pub fn replace_index_levels(&mut self, levels: &[IndexLevelPoint]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM index_levels", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO index_levels (date, level) VALUES (?1, ?2)")?;
            for point in levels {
                stmt.execute(params![point.date.to_string(), point.level])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the level series, ordered by date.
    pub fn load_index_levels(&self) -> Result<Vec<IndexLevelPoint>> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, level FROM index_levels ORDER BY date")?;
        let rows = stmt.query_map([], |row| {
            Ok(IndexLevelPoint {
                date: get_date(row, 0)?,
                level: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}

/// Read an ISO date column.
fn get_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DayDate> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> DayDate {
        DayDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn snapshot(id: u64, day: u32, edr: f64) -> Snapshot {
        Snapshot {
            universe_id: UniverseId(id),
            snapshot_date: date(day),
            name: format!("Title {id}"),
            developer: "Dev".to_string(),
            avg_ccu: 10.0,
            visits: 100.0,
            favorites: 5.0,
            likes: 4.0,
            monetization_count: 2.0,
            median_price: 49.0,
            price_dispersion: 0.1,
            engagement_score: 0.2,
            dau_est: 200.0,
            pcr: 0.01,
            aspu: 53.9,
            spend_revenue: edr,
            premium_revenue: 0.0,
            edr_raw: edr,
        }
    }

    #[test]
    fn test_snapshot_roundtrip_and_day_replace() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store
            .replace_day_snapshots(date(1), &[snapshot(1, 1, 100.0), snapshot(2, 1, 50.0)])
            .unwrap();
        store
            .replace_day_snapshots(date(2), &[snapshot(1, 2, 110.0)])
            .unwrap();

        assert_eq!(store.load_snapshots().unwrap().len(), 3);

        // Re-ingesting day 1 replaces its rows entirely.
        store
            .replace_day_snapshots(date(1), &[snapshot(1, 1, 123.0)])
            .unwrap();
        let all = store.load_snapshots().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].edr_raw, 123.0);
        assert_eq!(all[0].name, "Title 1");
    }

    #[test]
    fn test_feature_rewrite_and_optionals() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let rows = vec![
            FeatureRow {
                universe_id: UniverseId(1),
                as_of_date: date(7),
                edr_7d_mean: 10.0,
                edr_mom: Some(0.25),
                edr_14d_vol: None,
                coverage_7d: 1.0,
                score: 10.0,
            },
            FeatureRow {
                universe_id: UniverseId(2),
                as_of_date: date(7),
                edr_7d_mean: 5.0,
                edr_mom: None,
                edr_14d_vol: Some(1.5),
                coverage_7d: 0.5,
                score: 2.5,
            },
        ];
        store.rewrite_features(&rows).unwrap();

        let loaded = store.load_features_as_of(date(7)).unwrap();
        assert_eq!(loaded, rows);

        // Full rebuild replaces, never accumulates.
        store.rewrite_features(&rows[..1]).unwrap();
        assert_eq!(store.load_features_as_of(date(7)).unwrap().len(), 1);
    }

    #[test]
    fn test_membership_appends_across_dates() {
        let mut store = IndexStore::open_in_memory().unwrap();
        let week1 = vec![MembershipRecord {
            rebalance_date: date(7),
            universe_id: UniverseId(1),
            rank: 1,
            weight: 1.0,
        }];
        let week2 = vec![MembershipRecord {
            rebalance_date: date(14),
            universe_id: UniverseId(2),
            rank: 1,
            weight: 1.0,
        }];
        store.append_membership(&week1).unwrap();
        store.append_membership(&week2).unwrap();
        // Same-date re-run overwrites instead of duplicating.
        store.append_membership(&week1).unwrap();

        let history = store.load_membership().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].rebalance_date, date(7));
        assert_eq!(history[1].rebalance_date, date(14));
    }

    #[test]
    fn test_levels_replace_wholesale() {
        let mut store = IndexStore::open_in_memory().unwrap();
        store
            .replace_index_levels(&[IndexLevelPoint {
                date: date(7),
                level: 1000.0,
            }])
            .unwrap();
        store
            .replace_index_levels(&[
                IndexLevelPoint {
                    date: date(7),
                    level: 1000.0,
                },
                IndexLevelPoint {
                    date: date(8),
                    level: 1020.0,
                },
            ])
            .unwrap();

        let levels = store.load_index_levels().unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].level, 1020.0);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/rte_index.sqlite");
        {
            let mut store = IndexStore::open(&path).unwrap();
            store
                .replace_day_snapshots(date(1), &[snapshot(1, 1, 42.0)])
                .unwrap();
        }
        let store = IndexStore::open(&path).unwrap();
        assert_eq!(store.load_snapshots().unwrap().len(), 1);
    }
}
