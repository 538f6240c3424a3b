//! Confidence in schedule predictions, from the project's own history.
//!
//! Three sub-scores in [0, 1]:
//! - sample size: how many completed tasks carry estimate/actual data
//! - consistency: how close the average delay factor is to 1.0
//! - completeness: share of all tasks that have an estimate at all
//!
//! Composite = 0.3 * sample + 0.4 * consistency + 0.3 * completeness.

use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::variance::analyze_variance;

/// Sample size at which the sample score saturates.
pub const FULL_CONFIDENCE_SAMPLES: f64 = 30.0;

const SAMPLE_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.4;
const COMPLETENESS_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub confidence_score: f64,
    pub sample_size_score: f64,
    pub consistency_score: f64,
    pub completeness_score: f64,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub tasks_with_estimates: usize,
}

/// Score a project's task population.
pub fn score_confidence(tasks: &[Task]) -> ConfidenceReport {
    if tasks.is_empty() {
        return ConfidenceReport::default();
    }

    let variance = analyze_variance(tasks);
    let samples = variance.tasks_with_variance_data;

    let (sample_size_score, consistency_score) = if samples == 0 {
        (0.0, 0.0)
    } else {
        (
            (samples as f64 / FULL_CONFIDENCE_SAMPLES).min(1.0),
            (1.0 - (variance.average_delay_factor - 1.0).abs() / 2.0).max(0.0),
        )
    };

    let tasks_with_estimates = tasks
        .iter()
        .filter(|t| t.estimated_hours.is_some_and(|h| h > 0.0))
        .count();
    let completeness_score = tasks_with_estimates as f64 / tasks.len() as f64;

    let confidence_score = SAMPLE_WEIGHT * sample_size_score
        + CONSISTENCY_WEIGHT * consistency_score
        + COMPLETENESS_WEIGHT * completeness_score;

    ConfidenceReport {
        confidence_score: round3(confidence_score),
        sample_size_score: round3(sample_size_score),
        consistency_score: round3(consistency_score),
        completeness_score: round3(completeness_score),
        total_tasks: tasks.len(),
        completed_tasks: variance.total_completed_tasks,
        tasks_with_estimates,
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn done(id: &str, est: f64, actual: f64) -> Task {
        Task::new(id, id).completed().with_estimate(est).with_actual(actual)
    }

    #[test]
    fn empty_project_is_all_zero() {
        let r = score_confidence(&[]);
        assert_eq!(r, ConfidenceReport::default());
        assert_eq!(r.confidence_score, 0.0);
    }

    #[test]
    fn no_history_zeroes_sample_and_consistency() {
        let tasks = vec![
            Task::new("a", "a").with_estimate(8.0),
            Task::new("b", "b").with_estimate(4.0),
        ];
        let r = score_confidence(&tasks);
        assert_eq!(r.sample_size_score, 0.0);
        assert_eq!(r.consistency_score, 0.0);
        assert_eq!(r.completeness_score, 1.0);
        assert_eq!(r.confidence_score, 0.3);
    }

    #[test]
    fn perfect_estimates_with_full_sample() {
        let tasks: Vec<Task> = (0..30).map(|i| done(&format!("t{i}"), 8.0, 8.0)).collect();
        let r = score_confidence(&tasks);
        assert_eq!(r.sample_size_score, 1.0);
        assert_eq!(r.consistency_score, 1.0);
        assert_eq!(r.completeness_score, 1.0);
        assert_eq!(r.confidence_score, 1.0);
        assert_eq!(r.completed_tasks, 30);
    }

    #[test]
    fn mixed_project_rounds_to_three_places() {
        // One sample at factor 1.5, three tasks, two estimated.
        let tasks = vec![
            done("a", 8.0, 12.0),
            Task::new("b", "b").with_estimate(4.0),
            Task::new("c", "c"),
        ];
        let r = score_confidence(&tasks);
        assert_eq!(r.sample_size_score, 0.033);
        assert_eq!(r.consistency_score, 0.75);
        assert_eq!(r.completeness_score, 0.667);
        // 0.3 * 1/30 + 0.4 * 0.75 + 0.3 * 2/3 = 0.51
        assert_eq!(r.confidence_score, 0.51);
        assert_eq!(r.total_tasks, 3);
        assert_eq!(r.tasks_with_estimates, 2);
    }

    #[test]
    fn wild_overruns_floor_consistency_at_zero() {
        let r = score_confidence(&[done("a", 1.0, 10.0)]);
        assert_eq!(r.consistency_score, 0.0);
    }

    proptest! {
        #[test]
        fn score_is_bounded(
            rows in proptest::collection::vec(
                (any::<bool>(), proptest::option::of(0.0f64..200.0), proptest::option::of(0.0f64..400.0)),
                0..40,
            )
        ) {
            let tasks: Vec<Task> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (completed, est, actual))| {
                    let mut t = Task::new(format!("t{i}"), "t");
                    t.estimated_hours = est;
                    t.actual_hours = actual;
                    if completed { t.completed() } else { t }
                })
                .collect();
            let r = score_confidence(&tasks);
            prop_assert!((0.0..=1.0).contains(&r.confidence_score));
            prop_assert!((0.0..=1.0).contains(&r.sample_size_score));
            prop_assert!((0.0..=1.0).contains(&r.consistency_score));
            prop_assert!((0.0..=1.0).contains(&r.completeness_score));
        }
    }
}
