//! slipway-core: critical-path scheduling and schedule-risk analysis.
//!
//! Everything here is a pure function of a read-only project snapshot. No
//! I/O, no shared state between calls.

pub mod confidence;
pub mod critical_path;
pub mod duration;
pub mod error;
pub mod graph;
pub mod mitigation;
pub mod scenario;
pub mod suggestions;
pub mod task;
pub mod time;
pub mod variance;

pub use confidence::{ConfidenceReport, score_confidence};
pub use critical_path::{
    CriticalPathResult, CriticalTask, Schedule, TaskSchedule, critical_path, solve_schedule,
};
pub use duration::{DurationAdjustments, base_duration, resolve_duration};
pub use error::{EngineError, EngineResult};
pub use graph::TaskGraph;
pub use mitigation::{GeneratorSettings, Language, MitigationRequest};
pub use scenario::{
    ImpactedTask, ScenarioChanges, ScenarioDelta, ScenarioResult, ScheduleSummary,
    simulate_scenario,
};
pub use suggestions::{
    MitigationSuggestion, RiskCategory, SuggestionLevel, parse_mitigation_response,
};
pub use task::{Dependency, ProjectSnapshot, Task, TaskStatus};
pub use time::parse_task_datetime;
pub use variance::{VarianceReport, analyze_variance};

/// Critical path, variance, and confidence for one snapshot.
pub mod report {
    use serde::{Deserialize, Serialize};

    use super::{
        ConfidenceReport, CriticalPathResult, ProjectSnapshot, VarianceReport, analyze_variance,
        critical_path, score_confidence,
    };

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ProjectReport {
        pub critical_path: CriticalPathResult,
        pub variance: VarianceReport,
        pub confidence: ConfidenceReport,
    }

    pub fn project_report(snapshot: &ProjectSnapshot) -> ProjectReport {
        ProjectReport {
            critical_path: critical_path(&snapshot.tasks, &snapshot.dependencies),
            variance: analyze_variance(&snapshot.tasks),
            confidence: score_confidence(&snapshot.tasks),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::{Dependency, Task};

        #[test]
        fn report_bundles_all_three() {
            let snapshot = ProjectSnapshot::new(
                vec![
                    Task::new("a", "Design").with_estimate(16.0).completed().with_actual(20.0),
                    Task::new("b", "Build").with_estimate(24.0),
                ],
                vec![Dependency::new("b", "a")],
            );
            let r = project_report(&snapshot);
            assert_eq!(r.critical_path.task_ids, vec!["a", "b"]);
            assert_eq!(r.critical_path.total_duration, 5.0);
            assert_eq!(r.variance.average_delay_factor, 1.25);
            assert_eq!(r.confidence.total_tasks, 2);
            assert_eq!(r.confidence.tasks_with_estimates, 2);
        }
    }
}

pub use report::{ProjectReport, project_report};
