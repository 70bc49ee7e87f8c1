//! Run-file discovery.
//!
//! Raw snapshot runs land on disk as `runs/<YYYY-MM-DD>/pruned/*.json`, one
//! directory per collection day. Discovery returns the pruned files in
//! stable (date, path) order; directories that do not parse as a date are
//! skipped with a warning rather than failing the sweep.

use std::path::{Path, PathBuf};

use tracing::warn;
use types::DayDate;

use crate::error::{IngestError, Result};

/// One discovered pruned run file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFile {
    pub date: DayDate,
    pub path: PathBuf,
}

/// Find every pruned JSON file under `runs_dir`, sorted by date then path.
pub fn discover_run_files(runs_dir: &Path) -> Result<Vec<RunFile>> {
    if !runs_dir.is_dir() {
        return Err(IngestError::RunsDirNotFound(runs_dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in read_dir(runs_dir)? {
        let day_dir = entry.path();
        if !day_dir.is_dir() {
            continue;
        }
        let name = match day_dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        let date = match name.parse::<DayDate>() {
            Ok(date) => date,
            Err(_) => {
                warn!(dir = %day_dir.display(), "skipping non-date run directory");
                continue;
            }
        };

        let pruned = day_dir.join("pruned");
        if !pruned.is_dir() {
            warn!(dir = %day_dir.display(), "run directory has no pruned/ subdirectory");
            continue;
        }
        for entry in read_dir(&pruned)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(RunFile { date, path });
            }
        }
    }

    files.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

fn read_dir(dir: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    entries
        .map(|entry| {
            entry.map_err(|source| IngestError::Io {
                path: dir.to_path_buf(),
                source,
            })
        })
        .collect()
}
