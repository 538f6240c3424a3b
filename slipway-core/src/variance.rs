//! Historical estimation accuracy.
//!
//! A completed task with a positive estimate and a recorded actual gives one
//! delay factor (`actual / estimated`). Factors above 1.0 mean the team
//! underestimated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::task::Task;

pub const MILESTONE_BUCKET: &str = "milestone";
pub const REGULAR_BUCKET: &str = "regular";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub average_delay_factor: f64,
    pub variance_by_assignee: BTreeMap<String, f64>,
    pub variance_by_priority: BTreeMap<String, f64>,
    /// Always has exactly the `milestone` and `regular` keys.
    pub variance_by_milestone: BTreeMap<String, f64>,
    /// Every completed task, with or without estimate data.
    pub total_completed_tasks: usize,
    /// Completed tasks that produced a delay factor.
    pub tasks_with_variance_data: usize,
}

/// Running mean without keeping the samples around.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value_or(&self, default: f64) -> f64 {
        if self.count == 0 {
            default
        } else {
            self.sum / self.count as f64
        }
    }
}

fn group_means(groups: BTreeMap<String, Mean>) -> BTreeMap<String, f64> {
    groups
        .into_iter()
        .map(|(k, m)| (k, m.value_or(1.0)))
        .collect()
}

/// Aggregate delay factors over the project's task population.
///
/// Tasks that aren't completed are ignored, so passing the whole project is
/// fine.
pub fn analyze_variance(tasks: &[Task]) -> VarianceReport {
    let mut overall = Mean::default();
    let mut by_assignee: BTreeMap<String, Mean> = BTreeMap::new();
    let mut by_priority: BTreeMap<String, Mean> = BTreeMap::new();
    let mut milestone = Mean::default();
    let mut regular = Mean::default();
    let mut total_completed = 0usize;

    for task in tasks.iter().filter(|t| t.is_completed()) {
        total_completed += 1;
        let Some(factor) = task.delay_factor() else { continue };

        overall.push(factor);
        if let Some(assignee) = &task.assignee_id {
            by_assignee.entry(assignee.clone()).or_default().push(factor);
        }
        if let Some(priority) = &task.priority {
            by_priority.entry(priority.clone()).or_default().push(factor);
        }
        if task.is_milestone {
            milestone.push(factor);
        } else {
            regular.push(factor);
        }
    }

    let variance_by_milestone = BTreeMap::from([
        (MILESTONE_BUCKET.to_string(), milestone.value_or(1.0)),
        (REGULAR_BUCKET.to_string(), regular.value_or(1.0)),
    ]);

    VarianceReport {
        average_delay_factor: overall.value_or(1.0),
        variance_by_assignee: group_means(by_assignee),
        variance_by_priority: group_means(by_priority),
        variance_by_milestone,
        total_completed_tasks: total_completed,
        tasks_with_variance_data: overall.count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(id: &str, est: f64, actual: f64) -> Task {
        Task::new(id, id).completed().with_estimate(est).with_actual(actual)
    }

    #[test]
    fn no_history_defaults_to_one() {
        let r = analyze_variance(&[Task::new("a", "a").with_estimate(4.0)]);
        assert_eq!(r.average_delay_factor, 1.0);
        assert_eq!(r.variance_by_milestone[MILESTONE_BUCKET], 1.0);
        assert_eq!(r.variance_by_milestone[REGULAR_BUCKET], 1.0);
        assert!(r.variance_by_assignee.is_empty());
        assert_eq!(r.total_completed_tasks, 0);
        assert_eq!(r.tasks_with_variance_data, 0);
    }

    #[test]
    fn groups_by_assignee_priority_and_milestone() {
        let tasks = vec![
            done("a", 10.0, 20.0).with_assignee("ana").with_priority("high"),
            done("b", 10.0, 10.0).with_assignee("ana").with_priority("low"),
            done("c", 10.0, 5.0).with_assignee("ben").with_priority("high").milestone(),
        ];
        let r = analyze_variance(&tasks);

        assert!((r.average_delay_factor - (2.0 + 1.0 + 0.5) / 3.0).abs() < 1e-9);
        assert_eq!(r.variance_by_assignee["ana"], 1.5);
        assert_eq!(r.variance_by_assignee["ben"], 0.5);
        assert_eq!(r.variance_by_priority["high"], 1.25);
        assert_eq!(r.variance_by_priority["low"], 1.0);
        assert_eq!(r.variance_by_milestone[MILESTONE_BUCKET], 0.5);
        assert_eq!(r.variance_by_milestone[REGULAR_BUCKET], 1.5);
    }

    #[test]
    fn completed_count_includes_tasks_without_estimates() {
        let tasks = vec![
            done("a", 8.0, 12.0),
            Task::new("b", "b").completed(),
            Task::new("c", "c").completed().with_estimate(0.0).with_actual(2.0),
            done("d", 8.0, 8.0).with_status(crate::task::TaskStatus::InProgress),
        ];
        let r = analyze_variance(&tasks);
        assert_eq!(r.total_completed_tasks, 3);
        assert_eq!(r.tasks_with_variance_data, 1);
        assert_eq!(r.average_delay_factor, 1.5);
    }

    #[test]
    fn unassigned_tasks_are_not_grouped_by_assignee() {
        let r = analyze_variance(&[done("a", 4.0, 6.0)]);
        assert!(r.variance_by_assignee.is_empty());
        assert!(r.variance_by_priority.is_empty());
        assert_eq!(r.variance_by_milestone[REGULAR_BUCKET], 1.5);
    }

    #[test]
    fn report_serializes_bucket_keys() {
        let json = serde_json::to_string(&analyze_variance(&[])).unwrap();
        assert!(json.contains("\"variance_by_milestone\":{\"milestone\":1.0,\"regular\":1.0}"));
        assert!(json.contains("\"tasks_with_variance_data\":0"));
    }
}
