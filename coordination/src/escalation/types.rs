//! Input types handed to the escalation core by the external error detector
//! and auto-fixer. The core only ever reads these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad class of a detected failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Compile,
    TestFailure,
    Security,
    Logic,
    Runtime,
    Performance,
    /// Anything the detector could not place
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::TestFailure => write!(f, "test_failure"),
            Self::Security => write!(f, "security"),
            Self::Logic => write!(f, "logic"),
            Self::Runtime => write!(f, "runtime"),
            Self::Performance => write!(f, "performance"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Impact of a detected failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// How automatable a fix is judged to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fixability {
    AutoFixable,
    AgentFixable,
    HumanRequired,
    /// Detector gave no verdict
    Unknown,
}

impl std::fmt::Display for Fixability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoFixable => write!(f, "auto_fixable"),
            Self::AgentFixable => write!(f, "agent_fixable"),
            Self::HumanRequired => write!(f, "human_required"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A classified failure from the external detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedError {
    pub id: String,
    pub category: ErrorCategory,
    pub severity: Severity,
    pub fixability: Fixability,
    pub title: String,
    pub message: String,
    /// Where the failure came from (tool name, file, test id)
    pub source: String,
    /// Raw output the detector classified
    #[serde(default)]
    pub raw_text: String,
    pub detected_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
}

impl DetectedError {
    /// Build an error with the classification fields set and the rest empty
    pub fn new(
        id: impl Into<String>,
        category: ErrorCategory,
        severity: Severity,
        fixability: Fixability,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            fixability,
            title: String::new(),
            message: String::new(),
            source: String::new(),
            raw_text: String::new(),
            detected_at: Utc::now(),
            suggested_fix: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

/// Outcome reported by the external auto-fix heuristic.
///
/// Only carried through `create_escalations_from_fix_result`; the ladder does
/// not consult its fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFixResult {
    /// Whether every targeted error was fixed
    pub success: bool,
    /// IDs of errors the heuristic fixed
    #[serde(default)]
    pub fixed_errors: Vec<String>,
    /// Free-text description of what was changed
    #[serde(default)]
    pub changes: Vec<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_error_wire_format() {
        let json = r#"{
            "id": "err-1",
            "category": "test_failure",
            "severity": "high",
            "fixability": "agent_fixable",
            "title": "assertion failed",
            "message": "expected 2, got 3",
            "source": "cargo test",
            "rawText": "thread 'x' panicked",
            "detectedAt": "2026-01-01T00:00:00Z"
        }"#;
        let error: DetectedError = serde_json::from_str(json).unwrap();
        assert_eq!(error.category, ErrorCategory::TestFailure);
        assert_eq!(error.fixability, Fixability::AgentFixable);
        assert!(error.suggested_fix.is_none());

        let out = serde_json::to_string(&error).unwrap();
        assert!(out.contains("\"rawText\""));
        assert!(!out.contains("suggestedFix"));
    }

    #[test]
    fn test_display_matches_wire_names() {
        assert_eq!(ErrorCategory::TestFailure.to_string(), "test_failure");
        assert_eq!(Severity::Critical.to_string(), "critical");
        assert_eq!(Fixability::HumanRequired.to_string(), "human_required");
    }
}
