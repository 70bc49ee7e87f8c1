//! Export and report formatting for the RTE index engine.
//!
//! This crate is a pure formatter: it merges rows the engine already
//! produced and writes CSV, JSON, and Markdown artifacts. No numbers are
//! computed here beyond display aggregation.

pub mod error;
pub mod export;
pub mod weekly;

pub use error::{ReportError, Result};
pub use export::{build_export_rows, export_constituents, export_index_levels, ExportRow};
pub use weekly::write_weekly_report;
