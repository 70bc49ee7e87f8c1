//! Storage layer for the RTE index engine.
//!
//! Persistence is a collaborator, not part of the core: the engine stages
//! are pure transforms and this crate is the only place persisted tables
//! are read or written. Write semantics per table:
//!
//! - snapshots: append/replace by day
//! - features: full rebuild
//! - membership: append-only by rebalance date
//! - index levels: append/replace by date

mod schema;
mod store;

pub mod error;

pub use error::{Result, StorageError};
pub use schema::init_schema;
pub use store::IndexStore;
