//! RTE index pipeline - main binary
//!
//! Orchestrates one batch cycle over the raw runs directory:
//!
//! 1. Rebuild snapshots: load every pruned day file, estimate EDR, persist.
//! 2. Rebuild the rolling feature table from the full snapshot history.
//! 3. Optionally run a rebalance for a given date, then export the
//!    constituent tables, the weekly report, and the chain-linked level
//!    series.
//!
//! Every run recomputes from the full persisted history. The stages are
//! pure; this binary is where all I/O happens.

mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::{build_index_levels, estimate_day, rebalance, SnapshotHistory};
use ingest::{discover_run_files, load_day_file};
use report::{build_export_rows, export_constituents, export_index_levels, write_weekly_report};
use storage::IndexStore;
use types::{DayDate, Snapshot, WeightDriver};

pub use config::PipelineConfig;

/// RTE100 index pipeline: EDR estimation, rolling features, weekly
/// rebalance, and chain-linked index levels.
#[derive(Parser, Debug)]
#[command(name = "rte-index")]
#[command(about = "Daily EDR index pipeline for game titles")]
#[command(version)]
struct Args {
    /// Directory with raw runs (runs/<YYYY-MM-DD>/pruned/*.json)
    #[arg(long, env = "RTE_RUNS_DIR", default_value = "runs")]
    runs_dir: PathBuf,

    /// Directory for persisted tables and exports
    #[arg(long, env = "RTE_DATA_DIR", default_value = "index_data")]
    data_dir: PathBuf,

    /// Run a rebalance for this date (YYYY-MM-DD) after ingestion
    #[arg(long, env = "RTE_REBALANCE_DATE")]
    rebalance_date: Option<DayDate>,

    /// Target constituent count (K)
    #[arg(long, env = "RTE_CONSTITUENTS")]
    constituents: Option<usize>,

    /// Per-title weight cap
    #[arg(long, env = "RTE_WEIGHT_CAP")]
    weight_cap: Option<f64>,

    /// Hysteresis band width in ranks
    #[arg(long, env = "RTE_HYSTERESIS_BAND")]
    hysteresis_band: Option<usize>,

    /// Minimum 7-day coverage for eligibility
    #[arg(long, env = "RTE_MIN_COVERAGE")]
    min_coverage: Option<f64>,

    /// Weight constituents by trailing EDR mean instead of score
    #[arg(long, env = "RTE_WEIGHT_BY_EDR")]
    weight_by_edr: bool,

    /// Index base level at the first rebalance date
    #[arg(long, env = "RTE_BASE_LEVEL")]
    base_level: Option<f64>,
}

fn build_config(args: &Args) -> PipelineConfig {
    let mut config = PipelineConfig::default()
        .with_runs_dir(&args.runs_dir)
        .with_data_dir(&args.data_dir);

    if let Some(k) = args.constituents {
        config.rebalance = config.rebalance.with_constituent_count(k);
    }
    if let Some(cap) = args.weight_cap {
        config.rebalance = config.rebalance.with_weight_cap(cap);
    }
    if let Some(band) = args.hysteresis_band {
        config.rebalance = config.rebalance.with_hysteresis_band(band);
    }
    if let Some(coverage) = args.min_coverage {
        config.rolling = config.rolling.with_min_coverage(coverage);
    }
    if args.weight_by_edr {
        config.rebalance = config.rebalance.with_weight_driver(WeightDriver::EdrMean);
    }
    if let Some(level) = args.base_level {
        config.index_level = config.index_level.with_base_level(level);
    }
    config
}

/// Rebuild the snapshot table from the raw runs directory.
///
/// The day is the atomic unit: any unreadable or malformed day file aborts
/// the run with its error rather than being silently dropped.
fn update_snapshots(config: &PipelineConfig, store: &mut IndexStore) -> anyhow::Result<usize> {
    let files = discover_run_files(&config.runs_dir)?;
    let mut by_date: BTreeMap<DayDate, Vec<PathBuf>> = BTreeMap::new();
    for file in files {
        by_date.entry(file.date).or_default().push(file.path);
    }

    let mut total_rows = 0;
    for (date, paths) in &by_date {
        let mut records = Vec::new();
        for path in paths {
            let day_records = load_day_file(path)
                .with_context(|| format!("ingesting day {date}"))?;
            records.extend(day_records);
        }
        let snapshots = estimate_day(&records, *date, &config.edr)?;
        store.replace_day_snapshots(*date, &snapshots)?;
        total_rows += snapshots.len();
        info!(%date, titles = snapshots.len(), "ingested day");
    }
    Ok(total_rows)
}

/// Run the weekly rebalance and every export that hangs off it.
fn run_rebalance(
    config: &PipelineConfig,
    store: &mut IndexStore,
    history: &SnapshotHistory,
    rebalance_date: DayDate,
) -> anyhow::Result<()> {
    let features = history.features_as_of(rebalance_date, &config.rolling)?;
    let prior = store.load_membership()?;

    let result = rebalance(
        &features,
        rebalance_date,
        &prior,
        &config.rebalance,
        config.rolling.min_coverage,
    )?;
    info!(
        %rebalance_date,
        eligible = result.ranked.len(),
        constituents = result.membership.len(),
        "rebalance complete"
    );
    store.append_membership(&result.membership)?;

    // Constituent exports: dated copies plus latest.
    let latest: Vec<Snapshot> = history
        .latest_per_title(rebalance_date)
        .into_iter()
        .cloned()
        .collect();
    let rows = build_export_rows(&result.membership, &result.ranked, &latest);
    let exports_root = config.storage.exports_root();
    let exports_day = config.storage.exports_day(rebalance_date.to_string());
    export_constituents(&rows, &exports_root, &exports_day)?;

    // Weekly report against the full (now updated) membership history.
    let membership_all = store.load_membership()?;
    let reports_dir = exports_root.join("weekly_reports");
    let report_path =
        write_weekly_report(&reports_dir, rebalance_date, &rows, &membership_all)?;
    info!(report = %report_path.display(), "wrote weekly report");

    // Chain-linked level series: rebuild, persist, export.
    let levels = build_index_levels(history, &membership_all, &config.index_level)?;
    store.replace_index_levels(&levels)?;
    export_index_levels(&levels, &exports_day)?;
    if let Some(last) = levels.last() {
        info!(date = %last.date, level = last.level, "index level series rebuilt");
    }
    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = build_config(&args);
    config.validate().context("invalid configuration")?;

    let mut store = IndexStore::open(&config.storage.db_path())?;

    let rows = update_snapshots(&config, &mut store)?;
    info!(rows, "snapshot table rebuilt");

    let history = SnapshotHistory::from_snapshots(store.load_snapshots()?);
    let features = history.feature_table(&config.rolling)?;
    store.rewrite_features(&features)?;
    info!(rows = features.len(), "feature table rebuilt");

    if let Some(rebalance_date) = args.rebalance_date {
        run_rebalance(&config, &mut store, &history, rebalance_date)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(Args::parse())
}
