//! Escalation Engine — Deterministic decision-making for the escalation ladder
//!
//! Consumes DetectedErrors and attempt outcomes and produces new
//! EscalationStates. All decisions are deterministic; no fixes are executed
//! and no models are called from this module.

use crate::escalation::config::EscalationConfig;
use crate::escalation::error::{EscalationError, EscalationResult};
use crate::escalation::ids::{SequentialIdGenerator, SharedIdGenerator};
use crate::escalation::state::{
    AttemptOutcome, EscalationAttempt, EscalationLevel, EscalationState, EscalationStatus,
};
use crate::escalation::ticket::HumanEscalationTicket;
use crate::escalation::types::{AutoFixResult, DetectedError, ErrorCategory, Fixability, Severity};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Pick the starting rung for a new error. First matching rule wins.
pub fn initial_level(error: &DetectedError, config: &EscalationConfig) -> EscalationLevel {
    if error.severity == Severity::Critical && config.auto_escalate_critical {
        return EscalationLevel::AgentFix;
    }
    if error.category == ErrorCategory::Security {
        return EscalationLevel::Specialist;
    }
    match error.fixability {
        Fixability::AutoFixable => EscalationLevel::Retry,
        Fixability::AgentFixable => EscalationLevel::AgentFix,
        Fixability::HumanRequired => EscalationLevel::Human,
        Fixability::Unknown => EscalationLevel::Retry,
    }
}

/// Whether the caller should skip tracking and go straight to a person
pub fn should_immediately_escalate(error: &DetectedError, config: &EscalationConfig) -> bool {
    error.fixability == Fixability::HumanRequired
        || (error.severity == Severity::Critical
            && error.category == ErrorCategory::Security
            && config.auto_escalate_critical)
}

/// The Escalation Engine — deterministic state machine
pub struct EscalationEngine {
    config: EscalationConfig,
    ids: SharedIdGenerator,
}

impl EscalationEngine {
    /// Create a new engine with default config and its own ID counters
    pub fn new() -> Self {
        Self::with_config(EscalationConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: EscalationConfig) -> Self {
        Self {
            config,
            ids: SequentialIdGenerator::new().shared(),
        }
    }

    /// Swap in a different ID source
    pub fn with_id_generator(mut self, ids: SharedIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Start tracking an error at the rung chosen by [`initial_level`]
    pub fn create_escalation(&self, error: &DetectedError, task_id: &str) -> EscalationState {
        let level = initial_level(error, &self.config);
        let now = Utc::now();
        let state = EscalationState {
            id: self.ids.next_escalation_id(task_id),
            error: error.clone(),
            task_id: task_id.to_string(),
            current_level: level,
            status: EscalationStatus::Pending,
            attempts: Vec::new(),
            total_attempts: 0,
            human_ticket: None,
            abandon_reason: None,
            created_at: now,
            updated_at: now,
        };

        info!(
            escalation_id = %state.id,
            task_id,
            error_id = %error.id,
            level = %level,
            "Escalation created"
        );
        state
    }

    /// Open one escalation per error the auto-fixer left behind.
    ///
    /// `fix_result` is carried for the caller's bookkeeping only; the ladder
    /// does not cross-reference what the auto-fixer already tried.
    pub fn create_escalations_from_fix_result(
        &self,
        fix_result: &AutoFixResult,
        task_id: &str,
        remaining_errors: &[DetectedError],
    ) -> Vec<EscalationState> {
        debug!(
            task_id,
            fixed = fix_result.fixed_errors.len(),
            remaining = remaining_errors.len(),
            "Escalating errors left by auto-fix"
        );
        remaining_errors
            .iter()
            .map(|error| self.create_escalation(error, task_id))
            .collect()
    }

    /// Record the outcome of one attempt and return the next state.
    ///
    /// The input state is left untouched. Terminal states are rejected.
    pub fn record_attempt(
        &self,
        state: &EscalationState,
        outcome: AttemptOutcome,
    ) -> EscalationResult<EscalationState> {
        if state.is_terminal() {
            warn!(
                escalation_id = %state.id,
                status = %state.status,
                "Attempt recorded against terminal escalation"
            );
            return Err(EscalationError::already_terminal(&state.id, state.status));
        }

        let now = Utc::now();
        let attempt = EscalationAttempt {
            attempt_number: state.total_attempts + 1,
            level: state.current_level,
            action: outcome.action,
            agent_id: outcome.agent_id,
            resolved: outcome.resolved,
            result: outcome.result,
            duration_ms: outcome.duration_ms,
            timestamp: now,
        };

        let mut next = state.clone();
        next.attempts.push(attempt);
        next.total_attempts = next.attempts.len() as u32;
        next.updated_at = now;

        if outcome.resolved {
            next.status = EscalationStatus::Resolved;
            info!(
                escalation_id = %next.id,
                level = %next.current_level,
                attempts = next.total_attempts,
                "Escalation resolved"
            );
            return Ok(next);
        }

        if next.total_attempts >= self.config.max_total_attempts {
            info!(
                escalation_id = %next.id,
                attempts = next.total_attempts,
                max = self.config.max_total_attempts,
                "Attempt budget exhausted, handing to human"
            );
            return Ok(self.hand_to_human(next));
        }

        let next_level = self.next_level(&next);
        if next_level != next.current_level {
            info!(
                escalation_id = %next.id,
                from = %next.current_level,
                to = %next_level,
                "Escalating"
            );
        }
        next.current_level = next_level;

        if next_level == EscalationLevel::Human {
            return Ok(self.hand_to_human(next));
        }

        next.status = EscalationStatus::InProgress;
        debug!(summary = %next.summary(), "Attempt recorded");
        Ok(next)
    }

    /// Stop working an escalation without resolving it
    pub fn abandon(
        &self,
        state: &EscalationState,
        reason: impl Into<String>,
    ) -> EscalationResult<EscalationState> {
        if state.is_terminal() {
            return Err(EscalationError::already_terminal(&state.id, state.status));
        }

        let mut next = state.clone();
        next.status = EscalationStatus::Abandoned;
        next.abandon_reason = Some(reason.into());
        next.updated_at = Utc::now();
        info!(escalation_id = %next.id, reason = ?next.abandon_reason, "Escalation abandoned");
        Ok(next)
    }

    /// Cut a human ticket for `state` from the given attempt history
    pub fn create_human_ticket(
        &self,
        state: &EscalationState,
        attempts: &[EscalationAttempt],
    ) -> HumanEscalationTicket {
        HumanEscalationTicket::build(self.ids.next_ticket_id(), state, attempts, &self.config)
    }

    /// Rung for the next attempt after a failure at `state.current_level`.
    ///
    /// `state.attempts` already includes the failed attempt.
    fn next_level(&self, state: &EscalationState) -> EscalationLevel {
        match state.current_level {
            EscalationLevel::Retry => {
                if state.attempts_at_level(EscalationLevel::Retry) < self.config.max_retries {
                    EscalationLevel::Retry
                } else if self.config.skip_agent_for_simple
                    && state.error.severity == Severity::Low
                {
                    EscalationLevel::Specialist
                } else {
                    EscalationLevel::AgentFix
                }
            }
            level => level.next(),
        }
    }

    fn hand_to_human(&self, mut state: EscalationState) -> EscalationState {
        state.current_level = EscalationLevel::Human;
        state.status = EscalationStatus::HumanRequired;
        if state.human_ticket.is_none() {
            let ticket = self.create_human_ticket(&state, &state.attempts);
            info!(
                escalation_id = %state.id,
                ticket_id = %ticket.id,
                urgency = %ticket.urgency,
                "Human ticket created"
            );
            state.human_ticket = Some(ticket);
        }
        state
    }
}

impl Default for EscalationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::ticket::Urgency;

    fn error(category: ErrorCategory, severity: Severity, fixability: Fixability) -> DetectedError {
        DetectedError::new("err-1", category, severity, fixability).with_title("broken build")
    }

    fn fail(engine: &EscalationEngine, state: &EscalationState, n: u32) -> EscalationState {
        engine
            .record_attempt(state, AttemptOutcome::failed(format!("try {}", n), format!("fail {}", n)))
            .unwrap()
    }

    #[test]
    fn test_initial_level_precedence() {
        let config = EscalationConfig::default();

        // critical beats security
        let e = error(ErrorCategory::Security, Severity::Critical, Fixability::HumanRequired);
        assert_eq!(initial_level(&e, &config), EscalationLevel::AgentFix);

        // security beats fixability
        let e = error(ErrorCategory::Security, Severity::High, Fixability::AutoFixable);
        assert_eq!(initial_level(&e, &config), EscalationLevel::Specialist);

        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        assert_eq!(initial_level(&e, &config), EscalationLevel::Retry);
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AgentFixable);
        assert_eq!(initial_level(&e, &config), EscalationLevel::AgentFix);
        let e = error(ErrorCategory::Logic, Severity::Medium, Fixability::HumanRequired);
        assert_eq!(initial_level(&e, &config), EscalationLevel::Human);
        let e = error(ErrorCategory::Other, Severity::Medium, Fixability::Unknown);
        assert_eq!(initial_level(&e, &config), EscalationLevel::Retry);
    }

    #[test]
    fn test_critical_without_auto_escalate_falls_through() {
        let config = EscalationConfig {
            auto_escalate_critical: false,
            ..Default::default()
        };
        let e = error(ErrorCategory::Runtime, Severity::Critical, Fixability::AutoFixable);
        assert_eq!(initial_level(&e, &config), EscalationLevel::Retry);
    }

    #[test]
    fn test_should_immediately_escalate() {
        let config = EscalationConfig::default();
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::HumanRequired);
        assert!(should_immediately_escalate(&e, &config));

        let e = error(ErrorCategory::Security, Severity::Critical, Fixability::AgentFixable);
        assert!(should_immediately_escalate(&e, &config));

        let e = error(ErrorCategory::Security, Severity::High, Fixability::AgentFixable);
        assert!(!should_immediately_escalate(&e, &config));

        let off = EscalationConfig {
            auto_escalate_critical: false,
            ..Default::default()
        };
        let e = error(ErrorCategory::Security, Severity::Critical, Fixability::AgentFixable);
        assert!(!should_immediately_escalate(&e, &off));
    }

    #[test]
    fn test_create_escalation_defaults() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Compile, Severity::High, Fixability::AgentFixable);
        let state = engine.create_escalation(&e, "task-7");

        assert_eq!(state.id, "ESC-task-7-001");
        assert_eq!(state.current_level, EscalationLevel::AgentFix);
        assert_eq!(state.status, EscalationStatus::Pending);
        assert!(state.attempts.is_empty());
        assert_eq!(state.total_attempts, 0);
        assert!(state.human_ticket.is_none());
    }

    #[test]
    fn test_resolved_attempt_is_terminal_at_any_level() {
        let engine = EscalationEngine::new();
        for fixability in [
            Fixability::AutoFixable,
            Fixability::AgentFixable,
            Fixability::HumanRequired,
        ] {
            let e = error(ErrorCategory::Compile, Severity::Medium, fixability);
            let state = engine.create_escalation(&e, "t");
            let level = state.current_level;
            let next = engine
                .record_attempt(&state, AttemptOutcome::resolved("fix", "green"))
                .unwrap();
            assert_eq!(next.status, EscalationStatus::Resolved);
            assert_eq!(next.total_attempts, state.total_attempts + 1);
            assert_eq!(next.current_level, level);
            assert!(next.human_ticket.is_none());
        }
    }

    #[test]
    fn test_default_ladder_walk() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let mut state = engine.create_escalation(&e, "t");

        for n in 1..=4 {
            state = fail(&engine, &state, n);
            assert_eq!(state.status, EscalationStatus::InProgress);
        }
        state = fail(&engine, &state, 5);

        let levels: Vec<EscalationLevel> = state.attempts.iter().map(|a| a.level).collect();
        assert_eq!(
            levels,
            vec![
                EscalationLevel::Retry,
                EscalationLevel::Retry,
                EscalationLevel::Retry,
                EscalationLevel::AgentFix,
                EscalationLevel::Specialist,
            ]
        );
        assert_eq!(state.status, EscalationStatus::HumanRequired);
        assert_eq!(state.current_level, EscalationLevel::Human);
        let ticket = state.human_ticket.as_ref().unwrap();
        assert_eq!(ticket.id, "HUM-001");
        assert_eq!(ticket.attempts.len(), 5);
        assert_eq!(ticket.urgency, Urgency::Low);
    }

    #[test]
    fn test_attempt_numbers_increase() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let mut state = engine.create_escalation(&e, "t");
        for n in 1..=3 {
            state = fail(&engine, &state, n);
        }
        let numbers: Vec<u32> = state.attempts.iter().map(|a| a.attempt_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(state.failed_attempts().count(), 3);
        assert_eq!(state.last_attempt().unwrap().result, "fail 3");
        assert_eq!(state.total_attempts as usize, state.attempts.len());
    }

    #[test]
    fn test_input_state_not_mutated() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let state = engine.create_escalation(&e, "t");
        let before = state.clone();
        let _ = fail(&engine, &state, 1);
        assert_eq!(state, before);
    }

    #[test]
    fn test_specialist_failure_goes_to_human() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Security, Severity::High, Fixability::AgentFixable);
        let state = engine.create_escalation(&e, "t");
        assert_eq!(state.current_level, EscalationLevel::Specialist);

        let next = fail(&engine, &state, 1);
        assert_eq!(next.current_level, EscalationLevel::Human);
        assert_eq!(next.status, EscalationStatus::HumanRequired);
        assert_eq!(next.human_ticket.as_ref().unwrap().urgency, Urgency::Immediate);
    }

    #[test]
    fn test_total_budget_overrides_level_logic() {
        let config = EscalationConfig {
            max_retries: 10,
            max_total_attempts: 2,
            ..Default::default()
        };
        let engine = EscalationEngine::with_config(config);
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let state = engine.create_escalation(&e, "t");

        let state = fail(&engine, &state, 1);
        assert_eq!(state.current_level, EscalationLevel::Retry);
        let state = fail(&engine, &state, 2);
        assert_eq!(state.current_level, EscalationLevel::Human);
        assert_eq!(state.status, EscalationStatus::HumanRequired);
        assert!(state.human_ticket.is_some());
    }

    #[test]
    fn test_terminal_state_rejected() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let state = engine.create_escalation(&e, "t");
        let done = engine
            .record_attempt(&state, AttemptOutcome::resolved("fix", "ok"))
            .unwrap();

        let err = engine
            .record_attempt(&done, AttemptOutcome::failed("again", "nope"))
            .unwrap_err();
        assert!(matches!(
            err,
            EscalationError::AlreadyTerminal {
                status: EscalationStatus::Resolved,
                ..
            }
        ));
    }

    #[test]
    fn test_human_level_failure_creates_single_ticket() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Logic, Severity::Medium, Fixability::HumanRequired);
        let state = engine.create_escalation(&e, "t");
        assert!(state.human_ticket.is_none());

        let next = fail(&engine, &state, 1);
        assert_eq!(next.status, EscalationStatus::HumanRequired);
        assert_eq!(next.human_ticket.as_ref().unwrap().id, "HUM-001");
        assert!(engine
            .record_attempt(&next, AttemptOutcome::failed("x", "y"))
            .is_err());
    }

    #[test]
    fn test_skip_agent_for_simple() {
        let config = EscalationConfig {
            skip_agent_for_simple: true,
            max_retries: 1,
            ..Default::default()
        };
        let engine = EscalationEngine::with_config(config);

        let low = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let state = fail(&engine, &engine.create_escalation(&low, "t"), 1);
        assert_eq!(state.current_level, EscalationLevel::Specialist);

        let medium = error(ErrorCategory::Compile, Severity::Medium, Fixability::AutoFixable);
        let state = fail(&engine, &engine.create_escalation(&medium, "t"), 1);
        assert_eq!(state.current_level, EscalationLevel::AgentFix);
    }

    #[test]
    fn test_ticket_snapshot_without_full_context() {
        let config = EscalationConfig {
            include_full_context: false,
            max_total_attempts: 2,
            ..Default::default()
        };
        let engine = EscalationEngine::with_config(config);
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let mut state = engine.create_escalation(&e, "t");
        state = fail(&engine, &state, 1);
        state = fail(&engine, &state, 2);

        let ticket = state.human_ticket.unwrap();
        assert_eq!(ticket.attempts.len(), 1);
        assert_eq!(ticket.attempts[0].attempt_number, 2);
        assert_eq!(ticket.what_was_tried.lines().count(), 2);
    }

    #[test]
    fn test_abandon() {
        let engine = EscalationEngine::new();
        let e = error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable);
        let state = engine.create_escalation(&e, "t");
        let abandoned = engine.abandon(&state, "task cancelled").unwrap();
        assert_eq!(abandoned.status, EscalationStatus::Abandoned);
        assert_eq!(abandoned.abandon_reason.as_deref(), Some("task cancelled"));
        assert!(engine.abandon(&abandoned, "again").is_err());
    }

    #[test]
    fn test_escalations_from_fix_result() {
        let engine = EscalationEngine::new();
        let fix = AutoFixResult {
            success: false,
            fixed_errors: vec!["e0".to_string()],
            ..Default::default()
        };
        let remaining = vec![
            error(ErrorCategory::Compile, Severity::Low, Fixability::AutoFixable),
            error(ErrorCategory::Security, Severity::High, Fixability::AgentFixable),
        ];
        let states = engine.create_escalations_from_fix_result(&fix, "t", &remaining);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].current_level, EscalationLevel::Retry);
        assert_eq!(states[1].current_level, EscalationLevel::Specialist);
        assert_ne!(states[0].id, states[1].id);
    }
}
