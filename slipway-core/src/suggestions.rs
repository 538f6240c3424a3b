//! Strict validation of the generator's reply.
//!
//! The generator is asked for a JSON array of suggestion objects but may
//! answer with anything: a fenced code block, a single object, prose. Every
//! record is coerced into [`MitigationSuggestion`]; anything that can't be
//! coerced becomes a canned fallback. This never returns an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard cap on suggestions kept from one reply.
pub const MAX_SUGGESTIONS: usize = 8;

pub const UNABLE_STRATEGY: &str = "Unable to generate mitigation suggestions";
pub const NO_SUGGESTIONS_STRATEGY: &str = "No specific mitigation suggestions available";
pub const GENERAL_TARGET: &str = "general";

const FENCE: &str = "```";

/// Opening fence plus an optional language tag.
static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_-]*").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl SuggestionLevel {
    fn coerce(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str).map(|s| s.trim().to_lowercase()).as_deref() {
            Some("high") => SuggestionLevel::High,
            Some("low") => SuggestionLevel::Low,
            _ => SuggestionLevel::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    #[default]
    CriticalPath,
    Resource,
    Estimation,
    Dependency,
    Scope,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::CriticalPath,
        RiskCategory::Resource,
        RiskCategory::Estimation,
        RiskCategory::Dependency,
        RiskCategory::Scope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::CriticalPath => "critical_path",
            RiskCategory::Resource => "resource",
            RiskCategory::Estimation => "estimation",
            RiskCategory::Dependency => "dependency",
            RiskCategory::Scope => "scope",
        }
    }

    fn coerce(value: Option<&Value>) -> Self {
        let Some(raw) = value.and_then(Value::as_str) else {
            return RiskCategory::default();
        };
        let raw = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == raw)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationSuggestion {
    pub strategy: String,
    pub priority: SuggestionLevel,
    pub impact: String,
    pub effort: SuggestionLevel,
    pub target_tasks: Vec<String>,
    pub risk_category: RiskCategory,
}

impl MitigationSuggestion {
    /// Stand-in for a reply we couldn't use.
    pub fn unable() -> Self {
        Self::canned(UNABLE_STRATEGY, "Review critical path tasks manually")
    }

    /// Stand-in when the reply parsed but held nothing actionable.
    pub fn none_available() -> Self {
        Self::canned(
            NO_SUGGESTIONS_STRATEGY,
            "Current schedule data did not produce actionable suggestions",
        )
    }

    fn canned(strategy: &str, impact: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            priority: SuggestionLevel::Medium,
            impact: impact.to_string(),
            effort: SuggestionLevel::Medium,
            target_tasks: vec![GENERAL_TARGET.to_string()],
            risk_category: RiskCategory::CriticalPath,
        }
    }

    fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::unable();
        };

        Self {
            strategy: string_field(obj.get("strategy")),
            priority: SuggestionLevel::coerce(obj.get("priority")),
            impact: string_field(obj.get("impact")),
            effort: SuggestionLevel::coerce(obj.get("effort")),
            target_tasks: target_list(obj.get("target_tasks")),
            risk_category: RiskCategory::coerce(obj.get("risk_category")),
        }
    }
}

fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn target_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s.trim().to_string()],
        _ => vec![GENERAL_TARGET.to_string()],
    }
}

/// Remove a leading and/or trailing Markdown code fence.
///
/// Either end may be missing: truncated replies often open a fence and
/// never close it.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(m) = OPENING_FENCE.find(body) {
        body = body[m.end()..].trim_start();
    }
    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest.trim_end();
    }
    body
}

/// Parse and normalize a generator reply.
///
/// Always returns at least one record.
pub fn parse_mitigation_response(raw: &str) -> Vec<MitigationSuggestion> {
    let body = strip_code_fence(raw);

    let items = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(obj @ Value::Object(_)) => vec![obj],
        Ok(other) => {
            tracing::warn!(kind = value_kind(&other), "suggestion reply is not a list or object");
            return vec![MitigationSuggestion::unable()];
        }
        Err(e) => {
            tracing::warn!(error = %e, "suggestion reply is not valid JSON");
            return vec![MitigationSuggestion::unable()];
        }
    };

    if items.len() > MAX_SUGGESTIONS {
        tracing::debug!(received = items.len(), kept = MAX_SUGGESTIONS, "truncating suggestions");
    }

    let suggestions: Vec<MitigationSuggestion> = items
        .iter()
        .take(MAX_SUGGESTIONS)
        .map(MitigationSuggestion::from_value)
        .filter(|s| !s.strategy.is_empty())
        .collect();

    if suggestions.is_empty() {
        return vec![MitigationSuggestion::none_available()];
    }
    suggestions
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
