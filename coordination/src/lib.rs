//! Fix Coordination Library
//!
//! This library provides the decision core for errors that automation could
//! not fix on the first pass:
//! - An escalation ladder (retry → agent fix → specialist → human) that
//!   decides how hard to keep trying and when to cut a human ticket
//! - Plain-text reporting over sets of escalations
//! - A task-blocking registry recording which tasks are paused on which
//!   outstanding fix or investigation work
//!
//! The escalation engine and the blocking registry never call each other.
//! The caller sequences them: block when a rung dispatches work, report the
//! work's outcome to the registry, then record the attempt on the ladder.
//!
//! # Usage
//!
//! ```
//! use fix_coordination::blocking::TaskBlockingRegistry;
//! use fix_coordination::escalation::{
//!     AttemptOutcome, DetectedError, ErrorCategory, EscalationEngine, EscalationStatus,
//!     Fixability, Severity,
//! };
//!
//! let engine = EscalationEngine::new();
//! let mut registry = TaskBlockingRegistry::new();
//!
//! let error = DetectedError::new(
//!     "err-1",
//!     ErrorCategory::Compile,
//!     Severity::High,
//!     Fixability::AgentFixable,
//! );
//! let state = engine.create_escalation(&error, "task-1");
//!
//! registry.block_for_fix("task-1", "fix-1", None);
//! registry.fix_task_completed("fix-1");
//! let state = engine
//!     .record_attempt(&state, AttemptOutcome::resolved("agent patch", "build green"))
//!     .unwrap();
//!
//! assert_eq!(state.status, EscalationStatus::Resolved);
//! assert!(!registry.is_blocked("task-1"));
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod blocking;
pub mod escalation;

// Re-export key escalation types
pub use escalation::{
    AttemptOutcome, DetectedError, EscalationConfig, EscalationEngine, EscalationError,
    EscalationLevel, EscalationResult, EscalationState, EscalationStatus, HumanEscalationTicket,
};

// Re-export key blocking types
pub use blocking::{Block, BlockReason, BlockingEvent, SharedBlockingRegistry, TaskBlockingRegistry};
