//! CSV exports of the task store.
//!
//! tasks.csv (header required, optional columns may be absent or empty):
//!   id,title,status,priority,assignee_id,is_milestone,start_date,due_date,estimated_hours,actual_hours
//!
//! dependencies.csv:
//!   task_id,depends_on_id

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use slipway_core::{Dependency, ProjectSnapshot, Task, TaskStatus, parse_task_datetime};

#[derive(Debug, Deserialize)]
struct TaskRow {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    assignee_id: Option<String>,
    #[serde(default)]
    is_milestone: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    estimated_hours: Option<String>,
    #[serde(default)]
    actual_hours: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" | "" => Ok(false),
        other => bail!("invalid boolean '{other}'"),
    }
}

fn parse_hours(raw: Option<String>) -> Result<Option<f64>> {
    non_empty(raw)
        .map(|s| s.parse::<f64>().with_context(|| format!("invalid hours '{s}'")))
        .transpose()
}

impl TaskRow {
    fn into_task(self, tz: &str) -> Result<Task> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            bail!("task id must be non-empty");
        }

        let parse_date = |raw: Option<String>| -> Result<_> {
            non_empty(raw)
                .map(|s| parse_task_datetime(&s, tz).map_err(anyhow::Error::from))
                .transpose()
        };

        Ok(Task {
            title: non_empty(self.title).unwrap_or_else(|| id.clone()),
            status: non_empty(self.status)
                .map(|s| TaskStatus::from_label(&s))
                .unwrap_or_default(),
            priority: non_empty(self.priority),
            assignee_id: non_empty(self.assignee_id),
            is_milestone: match non_empty(self.is_milestone) {
                Some(raw) => parse_flag(&raw)?,
                None => false,
            },
            start_date: parse_date(self.start_date).context("start_date")?,
            due_date: parse_date(self.due_date).context("due_date")?,
            estimated_hours: parse_hours(self.estimated_hours).context("estimated_hours")?,
            actual_hours: parse_hours(self.actual_hours).context("actual_hours")?,
            id,
        })
    }
}

/// Parse a task export. Local dates are interpreted in the IANA zone `tz`.
pub fn parse_tasks_csv<R: Read>(reader: R, tz: &str) -> Result<Vec<Task>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut tasks = Vec::new();
    for (i, row) in rdr.deserialize::<TaskRow>().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let line = i + 2;
        let row = row.with_context(|| format!("tasks.csv line {line}"))?;
        tasks.push(row.into_task(tz).with_context(|| format!("tasks.csv line {line}"))?);
    }
    Ok(tasks)
}

pub fn parse_dependencies_csv<R: Read>(reader: R) -> Result<Vec<Dependency>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut deps = Vec::new();
    for (i, row) in rdr.deserialize::<Dependency>().enumerate() {
        let dep = row.with_context(|| format!("dependencies.csv line {}", i + 2))?;
        if dep.task_id.is_empty() || dep.depends_on_id.is_empty() {
            continue;
        }
        deps.push(dep);
    }
    Ok(deps)
}

pub fn load_snapshot_csv(
    tasks_path: impl AsRef<Path>,
    deps_path: Option<&Path>,
    tz: &str,
) -> Result<ProjectSnapshot> {
    let tasks_path = tasks_path.as_ref();
    let file = File::open(tasks_path).with_context(|| format!("opening {}", tasks_path.display()))?;
    let tasks = parse_tasks_csv(file, tz).with_context(|| format!("parsing {}", tasks_path.display()))?;

    let dependencies = match deps_path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("opening {}", p.display()))?;
            parse_dependencies_csv(file).with_context(|| format!("parsing {}", p.display()))?
        }
        None => Vec::new(),
    };

    tracing::debug!(
        tasks = tasks.len(),
        dependencies = dependencies.len(),
        "loaded CSV snapshot"
    );
    Ok(ProjectSnapshot::new(tasks, dependencies))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_sparse_rows() {
        let csv = "\
id,title,status,priority,assignee_id,is_milestone,start_date,due_date,estimated_hours,actual_hours
t1,Design,Completed,High,u1,no,2026-03-02,2026-03-04,16,20
t2,Launch,todo,,,yes,,,,
t3,,in progress,low,u2,,,,12.5,
";
        let tasks = parse_tasks_csv(csv.as_bytes(), "UTC").unwrap();
        assert_eq!(tasks.len(), 3);

        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert_eq!(tasks[0].priority.as_deref(), Some("High"));
        assert_eq!(tasks[0].actual_hours, Some(20.0));
        assert_eq!(
            tasks[0].start_date.unwrap().to_rfc3339(),
            "2026-03-02T00:00:00+00:00"
        );

        assert!(tasks[1].is_milestone);
        assert!(tasks[1].priority.is_none());
        assert!(tasks[1].estimated_hours.is_none());

        assert_eq!(tasks[2].title, "t3");
        assert_eq!(tasks[2].status, TaskStatus::InProgress);
        assert_eq!(tasks[2].estimated_hours, Some(12.5));
    }

    #[test]
    fn labels_match_the_json_loader() {
        let csv = "id,status,priority\na,Completed,P1 - Urgent\n";
        let from_csv = parse_tasks_csv(csv.as_bytes(), "UTC").unwrap();
        let from_json: Vec<Task> = serde_json::from_str(
            r#"[{"id":"a","title":"a","status":"Completed","priority":"P1 - Urgent"}]"#,
        )
        .unwrap();

        assert_eq!(from_csv[0].priority.as_deref(), Some("P1 - Urgent"));
        assert_eq!(from_csv[0].priority, from_json[0].priority);
        assert_eq!(from_csv[0].status, from_json[0].status);
        assert_eq!(from_csv[0].status, TaskStatus::Completed);
    }

    #[test]
    fn missing_optional_columns_are_fine() {
        let tasks = parse_tasks_csv("id,title\na,Alpha\n".as_bytes(), "UTC").unwrap();
        assert_eq!(tasks[0].title, "Alpha");
        assert!(!tasks[0].is_milestone);
    }

    #[test]
    fn bad_numbers_report_the_line() {
        let err = parse_tasks_csv("id,estimated_hours\na,lots\n".as_bytes(), "UTC").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn bad_dates_are_errors() {
        assert!(parse_tasks_csv("id,start_date\na,soon\n".as_bytes(), "UTC").is_err());
    }

    #[test]
    fn parses_dependencies_and_skips_blank_ids() {
        let deps = parse_dependencies_csv("task_id,depends_on_id\nb,a\n,a\nc,b\n".as_bytes()).unwrap();
        assert_eq!(deps, vec![Dependency::new("b", "a"), Dependency::new("c", "b")]);
    }
}
