//! Analysis command handlers for the CLI.
//!
//! These are called from `main` after the database pool is established and
//! migrations have run. `ingest` seeds the store from a CSV export on disk;
//! `stats` and `report` are read-only queries; `reset` deletes everything
//! behind an explicit confirmation flag.

mod ingest;
mod query;

pub(crate) use ingest::run_ingest;
pub(crate) use query::{run_report, run_reset, run_stats};
