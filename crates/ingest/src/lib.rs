//! Snapshot loader for the RTE index engine.
//!
//! Turns raw per-day run files into canonical [`types::TitleRecord`]s. The
//! engine never parses files itself; this crate is the only place raw JSON
//! is touched.

pub mod discover;
pub mod error;
pub mod loader;

pub use discover::{discover_run_files, RunFile};
pub use error::{IngestError, Result};
pub use loader::load_day_file;
