//! Duration resolution: how many days a task occupies in the schedule.
//!
//! Base duration comes from the task's own attributes and is floored at one
//! day. Simulation adjustments are applied on top of that floor, so a
//! scenario may legitimately shrink a task below a day.

use std::collections::{HashMap, HashSet};

use crate::task::Task;

/// Hours in one working day.
pub const HOURS_PER_DAY: f64 = 8.0;

/// Smallest base duration any task can have, in days.
pub const MIN_BASE_DAYS: f64 = 1.0;

/// Hypothetical changes applied while resolving durations for a scenario.
///
/// `Default` is the identity: no multipliers, no buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationAdjustments<'a> {
    /// task id -> duration multiplier
    pub duration_multipliers: Option<&'a HashMap<String, f64>>,
    /// assignee id -> efficiency multiplier (duration is divided by it)
    pub resource_efficiency: Option<&'a HashMap<String, f64>>,
    /// Fraction added to tasks on the baseline critical path (0.2 = +20%).
    pub buffer_percentage: f64,
    /// Critical-path task ids of the unmodified schedule.
    pub baseline_critical: Option<&'a HashSet<String>>,
}

impl<'a> DurationAdjustments<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn duration_multiplier(&self, task: &Task) -> Option<f64> {
        self.duration_multipliers
            .and_then(|m| m.get(&task.id))
            .copied()
    }

    /// Efficiency for the task's assignee, skipping non-positive values.
    pub fn efficiency(&self, task: &Task) -> Option<f64> {
        let assignee = task.assignee_id.as_ref()?;
        self.resource_efficiency
            .and_then(|m| m.get(assignee))
            .copied()
            .filter(|e| *e > 0.0)
    }

    /// Buffer factor when this task gets one, e.g. `Some(1.2)`.
    pub fn buffer_factor(&self, task: &Task) -> Option<f64> {
        if self.buffer_percentage <= 0.0 {
            return None;
        }
        let critical = self.baseline_critical?;
        critical
            .contains(&task.id)
            .then(|| 1.0 + self.buffer_percentage)
    }
}

/// Duration before any simulation adjustment.
///
/// Date range wins over estimated effort; a task with neither takes a day.
pub fn base_duration(task: &Task) -> f64 {
    if let (Some(start), Some(due)) = (task.start_date, task.due_date) {
        return (crate::time::whole_days_between(start, due) as f64).max(MIN_BASE_DAYS);
    }
    if let Some(hours) = task.estimated_hours {
        return (hours / HOURS_PER_DAY).max(MIN_BASE_DAYS);
    }
    MIN_BASE_DAYS
}

/// Resolve a task's duration in days under `adjustments`.
///
/// Order: per-task multiplier, then assignee efficiency, then the critical
/// path buffer.
pub fn resolve_duration(task: &Task, adjustments: &DurationAdjustments<'_>) -> f64 {
    let mut days = base_duration(task);

    if let Some(multiplier) = adjustments.duration_multiplier(task) {
        days *= multiplier;
    }
    if let Some(efficiency) = adjustments.efficiency(task) {
        days /= efficiency;
    }
    if let Some(factor) = adjustments.buffer_factor(task) {
        days *= factor;
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn dated(id: &str, days: i64) -> Task {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        Task::new(id, id).with_dates(start, start + Duration::days(days))
    }

    #[test]
    fn date_range_beats_estimate() {
        let t = dated("a", 5).with_estimate(80.0);
        assert_eq!(base_duration(&t), 5.0);
    }

    #[test]
    fn estimate_converts_hours_to_days() {
        let t = Task::new("a", "a").with_estimate(20.0);
        assert_eq!(base_duration(&t), 2.5);
    }

    #[test]
    fn base_is_floored_at_one_day() {
        assert_eq!(base_duration(&Task::new("a", "a")), 1.0);
        assert_eq!(base_duration(&Task::new("b", "b").with_estimate(2.0)), 1.0);
        assert_eq!(base_duration(&dated("c", 0)), 1.0);
        // due before start
        assert_eq!(base_duration(&dated("d", -3)), 1.0);
    }

    #[test]
    fn multipliers_apply_in_order_and_may_go_below_floor() {
        let task = Task::new("a", "a").with_estimate(16.0).with_assignee("u1");
        let mult: HashMap<String, f64> = [("a".to_string(), 0.25)].into();
        let eff: HashMap<String, f64> = [("u1".to_string(), 2.0)].into();
        let adj = DurationAdjustments {
            duration_multipliers: Some(&mult),
            resource_efficiency: Some(&eff),
            ..Default::default()
        };
        // 2.0 * 0.25 / 2.0
        assert_eq!(resolve_duration(&task, &adj), 0.25);
    }

    #[test]
    fn non_positive_efficiency_is_ignored() {
        let task = Task::new("a", "a").with_estimate(16.0).with_assignee("u1");
        let eff: HashMap<String, f64> = [("u1".to_string(), 0.0)].into();
        let adj = DurationAdjustments {
            resource_efficiency: Some(&eff),
            ..Default::default()
        };
        assert_eq!(resolve_duration(&task, &adj), 2.0);
    }

    #[test]
    fn efficiency_needs_an_assignee() {
        let task = Task::new("a", "a").with_estimate(16.0);
        let eff: HashMap<String, f64> = [("u1".to_string(), 0.5)].into();
        let adj = DurationAdjustments {
            resource_efficiency: Some(&eff),
            ..Default::default()
        };
        assert_eq!(resolve_duration(&task, &adj), 2.0);
    }

    #[test]
    fn buffer_only_hits_baseline_critical_tasks() {
        let critical: HashSet<String> = ["a".to_string()].into();
        let adj = DurationAdjustments {
            buffer_percentage: 0.5,
            baseline_critical: Some(&critical),
            ..Default::default()
        };
        assert_eq!(resolve_duration(&dated("a", 2), &adj), 3.0);
        assert_eq!(resolve_duration(&dated("b", 2), &adj), 2.0);
    }

    #[test]
    fn no_adjustments_is_base() {
        let t = dated("a", 4);
        assert_eq!(resolve_duration(&t, &DurationAdjustments::none()), base_duration(&t));
    }
}
