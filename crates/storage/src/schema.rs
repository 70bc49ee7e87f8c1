//! Database schema.
//!
//! This module only defines schema, no table logic. Dates are stored as ISO
//! text; per-table write semantics (replace-by-day, append-only) live in
//! [`crate::store`].

use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    // Snapshot table: one row per (title, day), replaced on re-ingestion.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            universe_id INTEGER NOT NULL,
            snapshot_date TEXT NOT NULL,
            name TEXT NOT NULL,
            developer TEXT NOT NULL,
            avg_ccu REAL NOT NULL,
            visits REAL NOT NULL,
            favorites REAL NOT NULL,
            likes REAL NOT NULL,
            monetization_count REAL NOT NULL,
            median_price REAL NOT NULL,
            price_dispersion REAL NOT NULL,
            engagement_score REAL NOT NULL,
            dau_est REAL NOT NULL,
            pcr REAL NOT NULL,
            aspu REAL NOT NULL,
            spend_revenue REAL NOT NULL,
            premium_revenue REAL NOT NULL,
            edr_raw REAL NOT NULL,
            UNIQUE(universe_id, snapshot_date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_date ON snapshots(snapshot_date)",
        [],
    )?;

    // Feature table: fully rebuilt each run.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS features (
            universe_id INTEGER NOT NULL,
            as_of_date TEXT NOT NULL,
            edr_7d_mean REAL NOT NULL,
            edr_mom REAL,
            edr_14d_vol REAL,
            coverage_7d REAL NOT NULL,
            score REAL NOT NULL,
            UNIQUE(universe_id, as_of_date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_features_date ON features(as_of_date)",
        [],
    )?;

    // Membership history: append-only by rebalance date.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS membership (
            rebalance_date TEXT NOT NULL,
            universe_id INTEGER NOT NULL,
            rank INTEGER NOT NULL,
            weight REAL NOT NULL,
            UNIQUE(rebalance_date, universe_id)
        )",
        [],
    )?;

    // Index level series: replaced wholesale on rebuild.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS index_levels (
            date TEXT NOT NULL UNIQUE,
            level REAL NOT NULL
        )",
        [],
    )?;

    Ok(())
}
