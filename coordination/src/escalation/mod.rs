//! Escalation Engine — Deterministic State Machine for Fix Escalation
//!
//! Decides how hard to keep trying on an error that automation could not fix
//! immediately, when to hand it to a more capable responder, and when to give
//! up and hand it to a person. This is a pure state machine: every transition
//! returns a new `EscalationState` and nothing here performs I/O.
//!
//! # Escalation Ladder
//!
//! ```text
//! Retry — max_retries attempts (default 3)
//!     │
//!     ▼
//! AgentFix — single shot
//!     │
//!     ▼
//! Specialist — single shot
//!     │
//!     ▼
//! Human — ticket generated, terminal
//!
//! Any rung → Human once max_total_attempts (default 5) is reached.
//! ```
//!
//! The starting rung depends on the error: critical errors skip retries,
//! security errors start at Specialist, and human-required errors start at
//! Human.

pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod report;
pub mod state;
pub mod ticket;
pub mod types;

pub use config::EscalationConfig;
pub use engine::{initial_level, should_immediately_escalate, EscalationEngine};
pub use error::{EscalationError, EscalationResult};
pub use ids::{IdGenerator, SequentialIdGenerator, SharedIdGenerator, UuidIdGenerator};
pub use report::{
    are_all_escalations_terminal, generate_escalation_summary, get_escalation_report,
};
pub use state::{
    AttemptOutcome, EscalationAttempt, EscalationLevel, EscalationState, EscalationStatus,
};
pub use ticket::{
    generate_failure_analysis, generate_human_suggestion, HumanEscalationTicket, TicketStatus,
    Urgency,
};
pub use types::{AutoFixResult, DetectedError, ErrorCategory, Fixability, Severity};
