//! Weekly rebalance report (Markdown).
//!
//! One self-contained file per rebalance: headline concentration numbers,
//! the top-10 table, entrants and exits versus the prior rebalance, and a
//! short data-quality section.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use types::{DayDate, MembershipRecord, UniverseId};

use crate::error::{ReportError, Result};
use crate::export::ExportRow;

/// Write the weekly report for one rebalance. Returns the report path.
pub fn write_weekly_report(
    reports_dir: &Path,
    rebalance_date: DayDate,
    rows: &[ExportRow],
    membership_history: &[MembershipRecord],
) -> Result<PathBuf> {
    fs::create_dir_all(reports_dir).map_err(|source| ReportError::Io {
        path: reports_dir.to_path_buf(),
        source,
    })?;

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# RTE100 Weekly Report — {rebalance_date}\n"));

    // Summary
    let top5: f64 = rows.iter().take(5).map(|r| r.weight).sum();
    let top10: f64 = rows.iter().take(10).map(|r| r.weight).sum();
    lines.push("## Summary\n".to_string());
    lines.push(format!("- Constituents: **{}**", rows.len()));
    lines.push(format!("- Top 5 concentration: **{}**", fmt_pct(top5)));
    lines.push(format!("- Top 10 concentration: **{}**\n", fmt_pct(top10)));

    // Top 10
    lines.push("## Top 10\n".to_string());
    lines.push(top_table(rows, 10));
    lines.push(String::new());

    // Entrants / exits vs the prior rebalance
    if let Some(prior_date) = prior_rebalance_date(membership_history, rebalance_date) {
        let prior: Vec<&MembershipRecord> = membership_history
            .iter()
            .filter(|m| m.rebalance_date == prior_date)
            .collect();
        let current_ids: BTreeSet<UniverseId> =
            rows.iter().map(|r| UniverseId(r.universe_id)).collect();
        let prior_ids: BTreeSet<UniverseId> = prior.iter().map(|m| m.universe_id).collect();

        lines.push(format!("\n## Changes vs {prior_date}\n"));

        let entrants: Vec<&ExportRow> = rows
            .iter()
            .filter(|r| !prior_ids.contains(&UniverseId(r.universe_id)))
            .collect();
        if !entrants.is_empty() {
            lines.push("### New entrants\n".to_string());
            lines.push(entrant_table(&entrants));
            lines.push(String::new());
        }

        let mut exits: Vec<&MembershipRecord> = prior
            .iter()
            .copied()
            .filter(|m| !current_ids.contains(&m.universe_id))
            .collect();
        exits.sort_by_key(|m| m.rank);
        if !exits.is_empty() {
            lines.push("### Exits\n".to_string());
            lines.push(exit_table(&exits));
            lines.push(String::new());
        }
    }

    // Data quality
    lines.push("\n## Data quality\n".to_string());
    let missing_mom = rows.iter().filter(|r| r.edr_mom.is_none()).count();
    let missing_vol = rows.iter().filter(|r| r.edr_14d_vol.is_none()).count();
    lines.push(format!(
        "- Missing `edr_mom`: **{missing_mom}/{}**",
        rows.len()
    ));
    lines.push(format!(
        "- Missing `edr_14d_vol`: **{missing_vol}/{}**",
        rows.len()
    ));

    let body = lines.join("\n").trim().to_string() + "\n";
    let path = reports_dir.join(format!("rte100_report_{rebalance_date}.md"));
    fs::write(&path, body).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Most recent rebalance date in the history strictly before `current`.
fn prior_rebalance_date(history: &[MembershipRecord], current: DayDate) -> Option<DayDate> {
    history
        .iter()
        .map(|m| m.rebalance_date)
        .filter(|d| *d < current)
        .max()
}

fn top_table(rows: &[ExportRow], n: usize) -> String {
    let mut out = vec![
        "| rank | name | developer | weight | edr_7d_mean | edr_mom | edr_14d_vol |".to_string(),
        "| --- | --- | --- | --- | --- | --- | --- |".to_string(),
    ];
    for row in rows.iter().take(n) {
        out.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} |",
            row.rank,
            row.name,
            row.developer,
            fmt_pct(row.weight),
            fmt_opt_num(row.edr_7d_mean, 2),
            fmt_opt_num(row.edr_mom, 3),
            fmt_opt_num(row.edr_14d_vol, 3),
        ));
    }
    out.join("\n")
}

fn entrant_table(entrants: &[&ExportRow]) -> String {
    let mut out = vec![
        "| rank | name | developer | weight | universeId |".to_string(),
        "| --- | --- | --- | --- | --- |".to_string(),
    ];
    for row in entrants {
        out.push(format!(
            "| {} | {} | {} | {} | {} |",
            row.rank,
            row.name,
            row.developer,
            fmt_pct(row.weight),
            row.universe_id,
        ));
    }
    out.join("\n")
}

fn exit_table(exits: &[&MembershipRecord]) -> String {
    let mut out = vec![
        "| rank | universeId | weight |".to_string(),
        "| --- | --- | --- |".to_string(),
    ];
    for member in exits {
        out.push(format!(
            "| {} | {} | {} |",
            member.rank,
            member.universe_id.0,
            fmt_pct(member.weight),
        ));
    }
    out.join("\n")
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Compact human number: K/M scaling past a thousand, em dash when missing.
fn fmt_opt_num(value: Option<f64>, digits: usize) -> String {
    let value = match value {
        Some(value) => value,
        None => return "—".to_string(),
    };
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.*}M", digits, value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.*}K", digits, value / 1_000.0)
    } else {
        format!("{value:.digits$}")
    }
}
