//! JSON project snapshots.
//!
//! Shape: `{"tasks": [Task...], "dependencies": [{"task_id", "depends_on_id"}...]}`.
//! `dependencies` may be omitted.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use slipway_core::ProjectSnapshot;

pub fn parse_snapshot_json(text: &str) -> Result<ProjectSnapshot> {
    let snapshot: ProjectSnapshot =
        serde_json::from_str(text).context("parse project snapshot JSON")?;
    tracing::debug!(
        tasks = snapshot.tasks.len(),
        dependencies = snapshot.dependencies.len(),
        "loaded JSON snapshot"
    );
    Ok(snapshot)
}

pub fn load_snapshot_json(path: impl AsRef<Path>) -> Result<ProjectSnapshot> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_snapshot_json(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_core::TaskStatus;

    #[test]
    fn parses_minimal_snapshot() {
        let s = parse_snapshot_json(
            r#"{
                "tasks": [
                    {"id": "t1", "title": "Design", "status": "completed",
                     "estimated_hours": 16, "actual_hours": 20, "assignee_id": "u1",
                     "start_date": "2026-03-02T09:00:00Z", "due_date": "2026-03-04T09:00:00Z"},
                    {"id": "t2", "title": "Build"}
                ],
                "dependencies": [{"task_id": "t2", "depends_on_id": "t1"}]
            }"#,
        )
        .unwrap();

        assert_eq!(s.tasks.len(), 2);
        assert_eq!(s.tasks[0].status, TaskStatus::Completed);
        assert_eq!(s.tasks[0].estimated_hours, Some(16.0));
        assert!(s.tasks[0].start_date.is_some());
        assert_eq!(s.tasks[1].status, TaskStatus::Todo);
        assert_eq!(s.dependencies[0].depends_on_id, "t1");
    }

    #[test]
    fn dependencies_are_optional() {
        let s = parse_snapshot_json(r#"{"tasks": []}"#).unwrap();
        assert!(s.dependencies.is_empty());
    }

    #[test]
    fn rejects_tasks_without_ids() {
        assert!(parse_snapshot_json(r#"{"tasks": [{"title": "x"}]}"#).is_err());
    }
}
