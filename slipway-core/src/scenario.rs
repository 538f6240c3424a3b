//! What-if simulation: re-solve the schedule under hypothetical changes and
//! diff it against the unmodified baseline.
//!
//! The modified schedule is a complete, independent solve over the surviving
//! tasks. Nothing is patched incrementally.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::critical_path::{Schedule, solve_schedule};
use crate::duration::DurationAdjustments;
use crate::task::{Dependency, Task, index_by_id};

/// Caller-supplied perturbations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioChanges {
    /// task id -> duration multiplier
    #[serde(default)]
    pub task_duration_adjustments: HashMap<String, f64>,
    /// Tasks excluded entirely, along with every edge touching them.
    #[serde(default)]
    pub remove_tasks: HashSet<String>,
    /// Extra fraction applied to baseline-critical tasks (0.1 = +10%).
    #[serde(default)]
    pub add_buffer_percentage: f64,
    /// assignee id -> efficiency multiplier
    #[serde(default)]
    pub resource_changes: HashMap<String, f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_duration: f64,
    pub critical_task_count: usize,
}

impl From<&Schedule> for ScheduleSummary {
    fn from(s: &Schedule) -> Self {
        Self {
            total_duration: s.total_duration,
            critical_task_count: s.critical_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDelta {
    pub duration_change_days: f64,
    pub critical_path_change: i64,
    pub duration_change_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactedTask {
    pub task_id: String,
    pub task_title: String,
    pub was_critical: bool,
    pub is_critical: bool,
    /// Human-readable list of what the scenario did to this task.
    pub changes: Vec<String>,
    /// Approximation: only the buffer is divided back out.
    pub baseline_duration: f64,
    pub modified_duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub baseline: ScheduleSummary,
    pub scenario: ScheduleSummary,
    pub delta: ScenarioDelta,
    pub impacted_tasks: Vec<ImpactedTask>,
    pub recommendations: Vec<String>,
}

/// Run a what-if scenario over a project's tasks and edges.
pub fn simulate_scenario(
    tasks: &[Task],
    edges: &[Dependency],
    changes: &ScenarioChanges,
) -> ScenarioResult {
    if tasks.is_empty() {
        return ScenarioResult {
            recommendations: vec!["No tasks in project to simulate.".to_string()],
            ..Default::default()
        };
    }

    // Baseline over the untouched snapshot.
    let baseline = solve_schedule(tasks, edges, &DurationAdjustments::none());
    let baseline_critical = baseline.critical_ids();

    // Modified snapshot.
    let modified_tasks: Vec<Task> = tasks
        .iter()
        .filter(|t| !changes.remove_tasks.contains(&t.id))
        .cloned()
        .collect();
    let modified_edges: Vec<Dependency> = edges
        .iter()
        .filter(|e| {
            !changes.remove_tasks.contains(&e.task_id)
                && !changes.remove_tasks.contains(&e.depends_on_id)
        })
        .cloned()
        .collect();

    let adjustments = DurationAdjustments {
        duration_multipliers: Some(&changes.task_duration_adjustments),
        resource_efficiency: Some(&changes.resource_changes),
        buffer_percentage: changes.add_buffer_percentage,
        baseline_critical: Some(&baseline_critical),
    };
    let modified = solve_schedule(&modified_tasks, &modified_edges, &adjustments);

    let baseline_summary = ScheduleSummary::from(&baseline);
    let scenario_summary = ScheduleSummary::from(&modified);
    let delta = diff(&baseline_summary, &scenario_summary);

    let impacted_tasks = impacted(&modified_tasks, &modified, &adjustments, &baseline_critical);
    let removed = tasks
        .iter()
        .filter(|t| changes.remove_tasks.contains(&t.id))
        .count();
    let buffer_days: f64 = impacted_tasks
        .iter()
        .filter(|t| t.was_critical && changes.add_buffer_percentage > 0.0)
        .map(|t| t.modified_duration - t.baseline_duration)
        .sum();

    let recommendations = recommend(&delta, removed, changes.add_buffer_percentage, buffer_days);

    tracing::info!(
        baseline = baseline_summary.total_duration,
        scenario = scenario_summary.total_duration,
        impacted = impacted_tasks.len(),
        removed,
        "scenario simulated"
    );

    ScenarioResult {
        baseline: baseline_summary,
        scenario: scenario_summary,
        delta,
        impacted_tasks,
        recommendations,
    }
}

fn diff(baseline: &ScheduleSummary, scenario: &ScheduleSummary) -> ScenarioDelta {
    let duration_change_days = scenario.total_duration - baseline.total_duration;
    let duration_change_percentage = if baseline.total_duration > 0.0 {
        duration_change_days / baseline.total_duration * 100.0
    } else {
        0.0
    };
    ScenarioDelta {
        duration_change_days,
        critical_path_change: scenario.critical_task_count as i64
            - baseline.critical_task_count as i64,
        duration_change_percentage,
    }
}

fn impacted(
    tasks: &[Task],
    modified: &Schedule,
    adjustments: &DurationAdjustments<'_>,
    baseline_critical: &HashSet<String>,
) -> Vec<ImpactedTask> {
    let by_id = index_by_id(tasks);
    let mut out = Vec::new();

    for entry in &modified.tasks {
        let Some(task) = by_id.get(entry.task_id.as_str()).copied() else { continue };

        let mut changes = Vec::new();
        if let Some(m) = adjustments.duration_multiplier(task) {
            changes.push(format!("Duration multiplied by {m}"));
        }
        if let Some(e) = adjustments.efficiency(task) {
            let assignee = task.assignee_id.as_deref().unwrap_or_default();
            changes.push(format!("Resource efficiency for {assignee} set to {e}"));
        }
        let buffer = adjustments.buffer_factor(task);
        if buffer.is_some() {
            changes.push(format!(
                "Buffer of {:.0}% added",
                adjustments.buffer_percentage * 100.0
            ));
        }

        let was_critical = baseline_critical.contains(&task.id);
        if changes.is_empty() && !was_critical && !entry.is_critical {
            continue;
        }

        let baseline_duration = match buffer {
            Some(factor) => entry.duration_days / factor,
            None => entry.duration_days,
        };

        out.push(ImpactedTask {
            task_id: entry.task_id.clone(),
            task_title: entry.task_title.clone(),
            was_critical,
            is_critical: entry.is_critical,
            changes,
            baseline_duration,
            modified_duration: entry.duration_days,
        });
    }

    out
}

fn recommend(delta: &ScenarioDelta, removed: usize, buffer_percentage: f64, buffer_days: f64) -> Vec<String> {
    let mut recs = Vec::new();

    if delta.duration_change_days > 0.0 {
        recs.push(format!(
            "Project duration increases by {:.1} days ({:.1}%).",
            delta.duration_change_days, delta.duration_change_percentage
        ));
    } else if delta.duration_change_days < 0.0 {
        recs.push(format!(
            "Project duration decreases by {:.1} days ({:.1}%).",
            delta.duration_change_days.abs(),
            delta.duration_change_percentage.abs()
        ));
    } else {
        recs.push("Project duration is unchanged (0.0%).".to_string());
    }

    if delta.critical_path_change > 0 {
        recs.push(format!(
            "Critical path grows by {} task(s); more of the schedule has no slack to absorb delays.",
            delta.critical_path_change
        ));
    } else if delta.critical_path_change < 0 {
        recs.push(format!(
            "Critical path shrinks by {} task(s); the schedule gains flexibility.",
            delta.critical_path_change.unsigned_abs()
        ));
    }

    if removed > 0 {
        recs.push(format!(
            "{removed} task(s) removed; confirm their scope is covered elsewhere."
        ));
    }

    if buffer_percentage > 0.0 {
        recs.push(format!(
            "A {:.0}% buffer adds {:.1} days of contingency across baseline critical tasks.",
            buffer_percentage * 100.0,
            buffer_days
        ));
    }

    recs
}
