//! Critical path method: forward pass, backward pass, slack.
//!
//! 1. **Forward pass** (topological order) computes earliest start/finish.
//! 2. **Backward pass** (reverse order) computes latest start/finish.
//! 3. **Slack** is `LS - ES`; a task is critical when `|slack| < 0.01`.
//!
//! Inside a cyclic subgraph some neighbours are visited out of order. A
//! predecessor that hasn't finished yet contributes 0, and a successor that
//! hasn't been scheduled backwards contributes the project duration.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::{DurationAdjustments, resolve_duration};
use crate::graph::TaskGraph;
use crate::task::{Dependency, Task, index_by_id};

/// Slack below this (in days) marks a task as critical.
pub const CRITICAL_SLACK_EPSILON: f64 = 0.01;

/// Computed times for one task, in days from project start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSchedule {
    pub task_id: String,
    pub task_title: String,
    pub duration_days: f64,
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    pub slack: f64,
    pub is_critical: bool,
}

/// A full solve: one entry per distinct task, in task order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub total_duration: f64,
    pub tasks: Vec<TaskSchedule>,
}

impl Schedule {
    pub fn get(&self, task_id: &str) -> Option<&TaskSchedule> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Critical tasks sorted by earliest start; ties keep task order.
    pub fn critical_tasks(&self) -> Vec<&TaskSchedule> {
        let mut critical: Vec<&TaskSchedule> = self.tasks.iter().filter(|t| t.is_critical).collect();
        critical.sort_by(|a, b| a.earliest_start.total_cmp(&b.earliest_start));
        critical
    }

    pub fn critical_ids(&self) -> HashSet<String> {
        self.tasks
            .iter()
            .filter(|t| t.is_critical)
            .map(|t| t.task_id.clone())
            .collect()
    }

    pub fn critical_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_critical).count()
    }
}

/// One entry of the critical path as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalTask {
    pub task_id: String,
    pub task_title: String,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub duration_days: f64,
    pub slack_days: f64,
    pub earliest_start: f64,
    pub earliest_finish: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathResult {
    pub task_ids: Vec<String>,
    pub total_duration: f64,
    pub critical_tasks: Vec<CriticalTask>,
}

/// Critical path of the current, unmodified schedule.
pub fn critical_path(tasks: &[Task], edges: &[Dependency]) -> CriticalPathResult {
    if tasks.is_empty() {
        return CriticalPathResult::default();
    }

    let schedule = solve_schedule(tasks, edges, &DurationAdjustments::none());
    let by_id = index_by_id(tasks);
    let critical_tasks: Vec<CriticalTask> = schedule
        .critical_tasks()
        .into_iter()
        .filter_map(|entry| {
            let task = by_id.get(entry.task_id.as_str())?;
            Some(CriticalTask {
                task_id: entry.task_id.clone(),
                task_title: task.title.clone(),
                start_date: task.start_date,
                due_date: task.due_date,
                duration_days: entry.duration_days,
                slack_days: entry.slack,
                earliest_start: entry.earliest_start,
                earliest_finish: entry.earliest_finish,
            })
        })
        .collect();

    CriticalPathResult {
        task_ids: critical_tasks.iter().map(|t| t.task_id.clone()).collect(),
        total_duration: schedule.total_duration,
        critical_tasks,
    }
}

/// Resolve durations under `adjustments` and run both passes.
pub fn solve_schedule(
    tasks: &[Task],
    edges: &[Dependency],
    adjustments: &DurationAdjustments<'_>,
) -> Schedule {
    if tasks.is_empty() {
        return Schedule::default();
    }

    let graph = TaskGraph::build(tasks, edges);
    let durations: Vec<f64> = (0..graph.len())
        .map(|node| resolve_duration(&tasks[graph.task_position(node)], adjustments))
        .collect();

    solve(&graph, tasks, &durations)
}

/// Run the forward and backward passes over a built graph.
///
/// `durations` is indexed by graph node.
pub fn solve(graph: &TaskGraph, tasks: &[Task], durations: &[f64]) -> Schedule {
    let n = graph.len();
    if n == 0 {
        return Schedule::default();
    }

    let fwd = forward_pass(graph, durations);
    let bwd = backward_pass(graph, durations, fwd.total_duration);

    let entries: Vec<TaskSchedule> = (0..n)
        .map(|node| {
            let slack = bwd.latest_start[node] - fwd.earliest_start[node];
            TaskSchedule {
                task_id: graph.id(node).to_string(),
                task_title: tasks[graph.task_position(node)].title.clone(),
                duration_days: durations[node],
                earliest_start: fwd.earliest_start[node],
                earliest_finish: fwd.earliest_finish[node],
                latest_start: bwd.latest_start[node],
                latest_finish: bwd.latest_finish[node],
                slack,
                is_critical: slack.abs() < CRITICAL_SLACK_EPSILON,
            }
        })
        .collect();

    let schedule = Schedule {
        total_duration: fwd.total_duration,
        tasks: entries,
    };
    tracing::debug!(
        tasks = n,
        total_duration = schedule.total_duration,
        critical = schedule.critical_count(),
        cyclic = graph.has_cycle(),
        "solved schedule"
    );
    schedule
}

struct ForwardResult {
    earliest_start: Vec<f64>,
    earliest_finish: Vec<f64>,
    total_duration: f64,
}

struct BackwardResult {
    latest_start: Vec<f64>,
    latest_finish: Vec<f64>,
}

/// ```text
/// ES[t] = 0                          if t is a start task
///       = max(EF[p] for p in preds)  otherwise
/// EF[t] = ES[t] + duration[t]
/// ```
fn forward_pass(graph: &TaskGraph, durations: &[f64]) -> ForwardResult {
    let n = graph.len();
    let mut starts = graph.start_nodes();
    if starts.is_empty() {
        // Fully cyclic: seed the first task so the schedule isn't empty.
        starts.push(0);
    }
    let mut is_start = vec![false; n];
    for s in starts {
        is_start[s] = true;
    }

    let mut earliest_start = vec![0.0; n];
    let mut earliest_finish: Vec<Option<f64>> = vec![None; n];

    for &node in graph.topological_order() {
        let es = if is_start[node] {
            0.0
        } else {
            graph
                .predecessors(node)
                .iter()
                .map(|&p| earliest_finish[p].unwrap_or(0.0))
                .fold(0.0, f64::max)
        };
        earliest_start[node] = es;
        earliest_finish[node] = Some(es + durations[node]);
    }

    let earliest_finish: Vec<f64> = earliest_finish.into_iter().map(|f| f.unwrap_or(0.0)).collect();
    let total_duration = earliest_finish.iter().copied().fold(0.0, f64::max);

    ForwardResult {
        earliest_start,
        earliest_finish,
        total_duration,
    }
}

/// ```text
/// LF[t] = project_duration           if t is an end task
///       = min(LS[s] for s in succs)  otherwise
/// LS[t] = LF[t] - duration[t]
/// ```
fn backward_pass(graph: &TaskGraph, durations: &[f64], total_duration: f64) -> BackwardResult {
    let n = graph.len();
    let mut latest_start: Vec<Option<f64>> = vec![None; n];
    let mut latest_finish = vec![total_duration; n];

    for &node in graph.topological_order().iter().rev() {
        let lf = graph
            .successors(node)
            .iter()
            .map(|&s| latest_start[s].unwrap_or(total_duration))
            .fold(total_duration, f64::min);
        latest_finish[node] = lf;
        latest_start[node] = Some(lf - durations[node]);
    }

    BackwardResult {
        latest_start: latest_start.into_iter().map(|s| s.unwrap_or(total_duration)).collect(),
        latest_finish,
    }
}
