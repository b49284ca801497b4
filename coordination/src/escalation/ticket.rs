//! Human escalation tickets.
//!
//! A ticket is the hand-off artifact produced once an error reaches the top of
//! the ladder. It carries everything a person needs to pick the problem up
//! without replaying the automated attempts: what was tried, why automation
//! gave up, and where to start looking.

use crate::escalation::config::EscalationConfig;
use crate::escalation::state::{EscalationAttempt, EscalationLevel, EscalationState};
use crate::escalation::types::{DetectedError, ErrorCategory, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How soon a person should look at the ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Immediate,
    Normal,
    Low,
}

impl Urgency {
    pub fn from_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::High => Self::Immediate,
            Severity::Medium => Self::Normal,
            Severity::Low => Self::Low,
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediate"),
            Self::Normal => write!(f, "normal"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Ticket lifecycle as tracked by the external ticket store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    Acknowledged,
    Resolved,
}

/// Structured hand-off to a person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanEscalationTicket {
    /// `HUM-{seq}`
    pub id: String,
    pub task_id: String,
    pub error: DetectedError,
    /// Attempts as they stood when the ticket was cut
    pub attempts: Vec<EscalationAttempt>,
    pub what_was_tried: String,
    pub why_auto_failed: String,
    pub suggested_approach: String,
    pub urgency: Urgency,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl HumanEscalationTicket {
    /// Cut a ticket for `state` given the full attempt history.
    ///
    /// `attempts` must include the attempt that pushed the state to `human`.
    pub fn build(
        id: impl Into<String>,
        state: &EscalationState,
        attempts: &[EscalationAttempt],
        config: &EscalationConfig,
    ) -> Self {
        let snapshot = if config.include_full_context {
            attempts.to_vec()
        } else {
            attempts.last().cloned().into_iter().collect()
        };

        Self {
            id: id.into(),
            task_id: state.task_id.clone(),
            error: state.error.clone(),
            attempts: snapshot,
            what_was_tried: describe_attempts(attempts),
            why_auto_failed: generate_failure_analysis(attempts),
            suggested_approach: generate_human_suggestion(&state.error, attempts),
            urgency: Urgency::from_severity(state.error.severity),
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }
}

/// One line per attempt: `1. [retry] cargo fix → FAILED: still broken`
pub fn describe_attempts(attempts: &[EscalationAttempt]) -> String {
    attempts
        .iter()
        .map(|a| {
            format!(
                "{}. [{}] {} → {}: {}",
                a.attempt_number,
                a.level,
                a.action,
                if a.resolved { "RESOLVED" } else { "FAILED" },
                a.result
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Explain why automation gave up
pub fn generate_failure_analysis(attempts: &[EscalationAttempt]) -> String {
    if attempts.is_empty() {
        return "No attempts were made.".to_string();
    }

    let failed: Vec<&EscalationAttempt> = attempts.iter().filter(|a| !a.resolved).collect();
    let Some(last_failure) = failed.last() else {
        return "All attempts succeeded (unexpected escalation).".to_string();
    };

    let mut levels: Vec<EscalationLevel> = Vec::new();
    for attempt in attempts {
        if !levels.contains(&attempt.level) {
            levels.push(attempt.level);
        }
    }
    let levels = levels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{} of {} attempts failed. Levels tried: {}. Last failure: {}.",
        failed.len(),
        attempts.len(),
        levels,
        last_failure.result
    )
}

/// Suggest where a person should start, keyed on the error category
pub fn generate_human_suggestion(error: &DetectedError, attempts: &[EscalationAttempt]) -> String {
    let lead = match error.category {
        ErrorCategory::Compile => "Review compilation errors for type mismatches and missing imports",
        ErrorCategory::TestFailure => {
            "Debug the failing assertions and check that test mocks match real behavior"
        }
        ErrorCategory::Security => "Security review required before any fix is merged",
        ErrorCategory::Logic => "Trace the business logic against the expected behavior",
        ErrorCategory::Runtime => {
            "Check for null references, async timing issues and resource handling"
        }
        ErrorCategory::Performance => "Profile the affected path to find the bottleneck",
        ErrorCategory::Other => "Review the error details and the failed attempts manually",
    };

    let mut parts = vec![lead.to_string()];
    if let Some(fix) = &error.suggested_fix {
        parts.push(format!("Suggested fix: {}", fix));
    }
    if let Some(last) = attempts.last() {
        parts.push(format!("Last attempt result: {}", last.result));
    }
    parts.join(". ")
}
