//! Task model as read from the project store.
//!
//! The engine only ever reads these; nothing in `slipway-core` mutates a
//! snapshot once it has been loaded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Serialized as snake_case; read through [`TaskStatus::from_label`] so every
/// loader accepts the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Blocked,
    Completed,
    Cancelled,
    /// Any label the store uses that we don't model explicitly.
    Other,
}

impl TaskStatus {
    /// Parse a free-form status label. Unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "todo" | "to_do" => TaskStatus::Todo,
            "in_progress" => TaskStatus::InProgress,
            "review" => TaskStatus::Review,
            "blocked" => TaskStatus::Blocked,
            "completed" => TaskStatus::Completed,
            "cancelled" | "canceled" => TaskStatus::Cancelled,
            _ => TaskStatus::Other,
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(TaskStatus::from_label(&label))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Display only.
    pub title: String,

    #[serde(default)]
    pub status: TaskStatus,

    /// Free-form label (high/medium/low in practice).
    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub assignee_id: Option<String>,

    #[serde(default)]
    pub is_milestone: bool,

    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub actual_hours: Option<f64>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: TaskStatus::Todo,
            priority: None,
            assignee_id: None,
            is_milestone: false,
            start_date: None,
            due_date: None,
            estimated_hours: None,
            actual_hours: None,
        }
    }

    pub fn with_dates(mut self, start: DateTime<Utc>, due: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self.due_date = Some(due);
        self
    }

    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_actual(mut self, hours: f64) -> Self {
        self.actual_hours = Some(hours);
        self
    }

    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn milestone(mut self) -> Self {
        self.is_milestone = true;
        self
    }

    pub fn completed(self) -> Self {
        self.with_status(TaskStatus::Completed)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Actual/estimated effort ratio, when this task has usable history.
    pub fn delay_factor(&self) -> Option<f64> {
        if !self.is_completed() {
            return None;
        }
        match (self.estimated_hours, self.actual_hours) {
            (Some(est), Some(actual)) if est > 0.0 => Some(actual / est),
            _ => None,
        }
    }
}

/// `task_id` cannot start until `depends_on_id` finishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub task_id: String,
    pub depends_on_id: String,
}

impl Dependency {
    pub fn new(task_id: impl Into<String>, depends_on_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            depends_on_id: depends_on_id.into(),
        }
    }
}

/// Read-only view of one project's tasks and edges.
///
/// Task order matters: it is the fallback order for cyclic subgraphs and the
/// tie-break order for the critical path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ProjectSnapshot {
    pub fn new(tasks: Vec<Task>, dependencies: Vec<Dependency>) -> Self {
        Self { tasks, dependencies }
    }
}

/// id -> task, keeping the first task for a repeated id.
pub(crate) fn index_by_id(tasks: &[Task]) -> HashMap<&str, &Task> {
    let mut by_id = HashMap::with_capacity(tasks.len());
    for task in tasks {
        by_id.entry(task.id.as_str()).or_insert(task);
    }
    by_id
}
