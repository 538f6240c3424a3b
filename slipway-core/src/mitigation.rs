//! Outbound contract for the external mitigation-suggestion generator.
//!
//! The engine never talks to the network. It builds the summary the
//! generator needs, renders the prompt, and checks that the caller handed
//! it a credential. Sending the request is the caller's job; validating the
//! reply lives in [`crate::suggestions`].

use serde::{Deserialize, Serialize};

use crate::confidence::ConfidenceReport;
use crate::critical_path::CriticalPathResult;
use crate::error::{EngineError, EngineResult};
use crate::suggestions::{MAX_SUGGESTIONS, RiskCategory};
use crate::variance::VarianceReport;

/// How many critical tasks go into the summary, by position.
pub const SUMMARY_TASK_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    He,
}

impl Language {
    fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::He => "Hebrew",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "he" => Ok(Language::He),
            other => Err(format!("unsupported language code: {other} (expected en or he)")),
        }
    }
}

/// Generator settings, passed in explicitly at call time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_key: Option<String>,
}

impl GeneratorSettings {
    /// The API key, or an error if none was configured.
    ///
    /// Call this before attempting any request: a missing credential is
    /// fatal, not something to degrade around.
    pub fn require_api_key(&self) -> EngineResult<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(EngineError::MissingCredential {
                setting: "api_key".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTask {
    pub task_id: String,
    pub title: String,
    pub duration_days: f64,
    pub slack_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPathSummary {
    pub total_duration: f64,
    pub task_count: usize,
    pub tasks: Vec<SummaryTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceSummary {
    pub average_delay_factor: f64,
    pub total_completed_tasks: usize,
    pub tasks_with_variance_data: usize,
    pub variance_by_priority: std::collections::BTreeMap<String, f64>,
    pub variance_by_milestone: std::collections::BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub confidence_score: f64,
    pub sample_size_score: f64,
    pub consistency_score: f64,
    pub completeness_score: f64,
}

/// The structured summary sent to the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationRequest {
    pub language: Language,
    pub critical_path: CriticalPathSummary,
    pub variance: VarianceSummary,
    pub confidence: ConfidenceSummary,
}

impl MitigationRequest {
    pub fn build(
        path: &CriticalPathResult,
        variance: &VarianceReport,
        confidence: &ConfidenceReport,
        language: Language,
    ) -> Self {
        let tasks = path
            .critical_tasks
            .iter()
            .take(SUMMARY_TASK_LIMIT)
            .map(|t| SummaryTask {
                task_id: t.task_id.clone(),
                title: t.task_title.clone(),
                duration_days: t.duration_days,
                slack_days: t.slack_days,
            })
            .collect();

        Self {
            language,
            critical_path: CriticalPathSummary {
                total_duration: path.total_duration,
                task_count: path.critical_tasks.len(),
                tasks,
            },
            variance: VarianceSummary {
                average_delay_factor: variance.average_delay_factor,
                total_completed_tasks: variance.total_completed_tasks,
                tasks_with_variance_data: variance.tasks_with_variance_data,
                variance_by_priority: variance.variance_by_priority.clone(),
                variance_by_milestone: variance.variance_by_milestone.clone(),
            },
            confidence: ConfidenceSummary {
                confidence_score: confidence.confidence_score,
                sample_size_score: confidence.sample_size_score,
                consistency_score: confidence.consistency_score,
                completeness_score: confidence.completeness_score,
            },
        }
    }

    /// System instruction for the generator.
    pub fn system_prompt(&self) -> String {
        let categories = RiskCategory::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "You are a project risk analyst. Reply with a JSON array of at most {MAX_SUGGESTIONS} objects \
             and nothing else. Each object has keys: \"strategy\" (string), \"priority\" (high|medium|low), \
             \"impact\" (string), \"effort\" (low|medium|high), \"target_tasks\" (array of task ids), \
             \"risk_category\" ({categories}). Write strategy and impact in {}.",
            self.language.display_name()
        )
    }

    /// User message: the JSON summary.
    pub fn user_prompt(&self) -> String {
        let summary = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        format!(
            "Suggest mitigations for the schedule risks in this project summary:\n\n{summary}"
        )
    }
}
