//! Pruned run-file loading.
//!
//! A day file carries one of three JSON shapes, all observed in the wild:
//! an object with a `data` array, an object mapping ids to records, or a
//! bare array of records. Anything else is a malformed day.

use std::path::Path;

use serde_json::Value;
use types::TitleRecord;

use crate::error::{IngestError, Result};

/// Load one pruned day file into canonical records.
///
/// The day is the atomic ingestion unit: if the file shape or any record in
/// it is malformed, the whole day fails and the error propagates.
pub fn load_day_file(path: &Path) -> Result<Vec<TitleRecord>> {
    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| IngestError::Record {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = extract_rows(value).ok_or_else(|| IngestError::UnsupportedShape {
        path: path.to_path_buf(),
    })?;

    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| IngestError::Record {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// Pull the record list out of whichever accepted shape the file uses.
fn extract_rows(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(rows) => Some(rows),
        Value::Object(mut obj) => {
            if let Some(Value::Array(rows)) = obj.remove("data") {
                return Some(rows);
            }
            if !obj.is_empty() && obj.values().all(Value::is_object) {
                return Some(obj.into_iter().map(|(_, row)| row).collect());
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use types::UniverseId;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_data_wrapper_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "day.json",
            r#"{"data": [{"universeId": 1, "players": 10}, {"universeId": 2}]}"#,
        );

        let records = load_day_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].universe_id, UniverseId(1));
        assert_eq!(records[0].players, Some(10.0));
    }

    #[test]
    fn test_map_of_records_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "day.json",
            r#"{"1": {"universeId": 1}, "2": {"universeId": 2}}"#,
        );

        let mut records = load_day_file(&path).unwrap();
        records.sort_by_key(|r| r.universe_id);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].universe_id, UniverseId(2));
    }

    #[test]
    fn test_bare_list_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "day.json", r#"[{"id": "7", "visits": 123}]"#);

        let records = load_day_file(&path).unwrap();
        assert_eq!(records[0].universe_id, UniverseId(7));
        assert_eq!(records[0].visits, Some(123.0));
    }

    #[test]
    fn test_unsupported_shape_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "day.json", r#""just a string""#);
        assert!(matches!(
            load_day_file(&path),
            Err(IngestError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_malformed_record_fails_the_day() {
        // The second record has no usable id: the whole day errors out
        // rather than silently dropping the row.
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "day.json",
            r#"[{"universeId": 1}, {"name": "no id"}]"#,
        );
        assert!(matches!(
            load_day_file(&path),
            Err(IngestError::Record { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "day.json", "{not json");
        assert!(matches!(load_day_file(&path), Err(IngestError::Record { .. })));
    }
}
