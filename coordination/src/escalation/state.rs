//! Escalation State — per-error ladder position and attempt history

use crate::escalation::ticket::HumanEscalationTicket;
use crate::escalation::types::DetectedError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rungs of the escalation ladder, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    /// Re-run the cheap automated fix
    Retry,
    /// Hand to a general coding agent
    AgentFix,
    /// Hand to a specialist agent or trusted reviewer
    Specialist,
    /// Hand to a person
    Human,
}

impl EscalationLevel {
    /// The next rung up. `Human` is the ceiling.
    pub fn next(self) -> Self {
        match self {
            Self::Retry => Self::AgentFix,
            Self::AgentFix => Self::Specialist,
            Self::Specialist => Self::Human,
            Self::Human => Self::Human,
        }
    }
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::AgentFix => write!(f, "agent_fix"),
            Self::Specialist => write!(f, "specialist"),
            Self::Human => write!(f, "human"),
        }
    }
}

/// Lifecycle status of an escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    Pending,
    InProgress,
    Resolved,
    Escalated,
    HumanRequired,
    Abandoned,
}

impl EscalationStatus {
    /// Terminal statuses accept no further attempts
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::HumanRequired | Self::Abandoned)
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Resolved => write!(f, "resolved"),
            Self::Escalated => write!(f, "escalated"),
            Self::HumanRequired => write!(f, "human_required"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Record of one fix attempt. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationAttempt {
    /// 1-indexed, strictly increasing within a state
    pub attempt_number: u32,
    /// Ladder level active when the attempt was made
    pub level: EscalationLevel,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub resolved: bool,
    pub result: String,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// What the caller reports back after running one attempt
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub action: String,
    pub resolved: bool,
    pub result: String,
    pub duration_ms: u64,
    pub agent_id: Option<String>,
}

impl AttemptOutcome {
    pub fn resolved(action: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resolved: true,
            result: result.into(),
            duration_ms: 0,
            agent_id: None,
        }
    }

    pub fn failed(action: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resolved: false,
            result: result.into(),
            duration_ms: 0,
            agent_id: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// Full escalation state for one detected error.
///
/// Treated as an immutable value: the engine returns a fresh state for every
/// transition and never touches the one it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationState {
    /// `ESC-{taskId}-{seq}`
    pub id: String,
    pub error: DetectedError,
    pub task_id: String,
    pub current_level: EscalationLevel,
    pub status: EscalationStatus,
    pub attempts: Vec<EscalationAttempt>,
    /// Always equal to `attempts.len()`
    pub total_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_ticket: Option<HumanEscalationTicket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandon_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EscalationState {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Number of attempts made while at `level`
    pub fn attempts_at_level(&self, level: EscalationLevel) -> u32 {
        self.attempts.iter().filter(|a| a.level == level).count() as u32
    }

    pub fn last_attempt(&self) -> Option<&EscalationAttempt> {
        self.attempts.last()
    }

    pub fn failed_attempts(&self) -> impl Iterator<Item = &EscalationAttempt> {
        self.attempts.iter().filter(|a| !a.resolved)
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "id={} task={} level={} status={} attempts={}",
            self.id, self.task_id, self.current_level, self.status, self.total_attempts,
        )
    }
}
