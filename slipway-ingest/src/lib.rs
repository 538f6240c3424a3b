//! slipway-ingest: loads project snapshots (tasks + dependency edges) from
//! JSON documents or CSV exports of the task store.

pub mod parsers;
pub mod types;

pub use parsers::csv_export::{load_snapshot_csv, parse_dependencies_csv, parse_tasks_csv};
pub use parsers::json_snapshot::{load_snapshot_json, parse_snapshot_json};
pub use types::SnapshotSource;
