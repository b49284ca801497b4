//! Plain-text summaries over a set of escalations

use crate::escalation::state::{EscalationState, EscalationStatus};

/// One-line roll-up, e.g. `3 escalation(s), 1 resolved, 2 pending`
pub fn generate_escalation_summary(states: &[EscalationState]) -> String {
    if states.is_empty() {
        return "No escalations needed".to_string();
    }

    let resolved = count_where(states, |s| s == EscalationStatus::Resolved);
    let pending = count_where(states, is_active);
    let human = count_where(states, |s| s == EscalationStatus::HumanRequired);
    let abandoned = count_where(states, |s| s == EscalationStatus::Abandoned);

    let mut parts = vec![format!("{} escalation(s)", states.len())];
    if resolved > 0 {
        parts.push(format!("{} resolved", resolved));
    }
    if pending > 0 {
        parts.push(format!("{} pending", pending));
    }
    if human > 0 {
        parts.push(format!("{} need human review", human));
    }
    if abandoned > 0 {
        parts.push(format!("{} abandoned", abandoned));
    }
    parts.join(", ")
}

/// Sectioned report: human review first, then active work, then resolved
pub fn get_escalation_report(states: &[EscalationState]) -> String {
    if states.is_empty() {
        return "No escalations to report.".to_string();
    }

    let mut out = String::from("## Escalation Report\n\n");
    out.push_str(&generate_escalation_summary(states));
    out.push('\n');

    let human: Vec<&EscalationState> = states
        .iter()
        .filter(|s| s.status == EscalationStatus::HumanRequired)
        .collect();
    if !human.is_empty() {
        out.push_str("\n### 🔴 Human Review Required\n");
        for s in human {
            let ticket = s
                .human_ticket
                .as_ref()
                .map(|t| t.id.as_str())
                .unwrap_or("no ticket");
            out.push_str(&format!(
                "- {} {}: ticket {}, {} attempts\n",
                s.id,
                title_of(s),
                ticket,
                s.total_attempts
            ));
        }
    }

    let active: Vec<&EscalationState> = states.iter().filter(|s| is_active(s.status)).collect();
    if !active.is_empty() {
        out.push_str("\n### 🟡 In Progress\n");
        for s in active {
            out.push_str(&format!(
                "- {} {}: level {}, {} attempts\n",
                s.id,
                title_of(s),
                s.current_level,
                s.total_attempts
            ));
        }
    }

    let resolved: Vec<&EscalationState> = states
        .iter()
        .filter(|s| s.status == EscalationStatus::Resolved)
        .collect();
    if !resolved.is_empty() {
        out.push_str("\n### 🟢 Resolved\n");
        for s in resolved {
            out.push_str(&format!(
                "- {} {}: {} attempts\n",
                s.id,
                title_of(s),
                s.total_attempts
            ));
        }
    }

    out
}

/// True when no escalation can take another attempt. Vacuously true.
pub fn are_all_escalations_terminal(states: &[EscalationState]) -> bool {
    states.iter().all(EscalationState::is_terminal)
}

fn count_where(states: &[EscalationState], pred: impl Fn(EscalationStatus) -> bool) -> usize {
    states.iter().filter(|s| pred(s.status)).count()
}

fn is_active(status: EscalationStatus) -> bool {
    matches!(
        status,
        EscalationStatus::Pending | EscalationStatus::InProgress | EscalationStatus::Escalated
    )
}

fn title_of(state: &EscalationState) -> &str {
    if state.error.title.is_empty() {
        &state.error.id
    } else {
        &state.error.title
    }
}
