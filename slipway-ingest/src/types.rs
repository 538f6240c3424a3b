use std::path::PathBuf;

use anyhow::Result;
use slipway_core::ProjectSnapshot;

use crate::parsers::csv_export::load_snapshot_csv;
use crate::parsers::json_snapshot::load_snapshot_json;

/// Default timezone for local dates in CSV exports.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Where a project snapshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// One JSON document: `{"tasks": [...], "dependencies": [...]}`.
    Json(PathBuf),
    /// A task export plus an edge export. Local dates are read in `timezone`.
    Csv {
        tasks: PathBuf,
        dependencies: Option<PathBuf>,
        timezone: String,
    },
}

impl SnapshotSource {
    pub fn load(&self) -> Result<ProjectSnapshot> {
        match self {
            SnapshotSource::Json(path) => load_snapshot_json(path),
            SnapshotSource::Csv {
                tasks,
                dependencies,
                timezone,
            } => load_snapshot_csv(tasks, dependencies.as_deref(), timezone),
        }
    }
}
