//! Task-Blocking Registry — which tasks are paused and on what
//!
//! Independent of the escalation engine. An orchestrator composes the two:
//! every ladder rung that dispatches new work calls `block_for_*`, and the
//! dispatched work's outcome is reported through `fix_task_completed` or
//! `fix_task_failed` before the matching `record_attempt`.
//!
//! ```text
//! record_attempt → rung changes → block_for_fix(task, fix)
//!                                      │
//!                  ┌───────────────────┴───────────────────┐
//!                  ▼                                       ▼
//!       fix_task_completed(fix)                  fix_task_failed(fix)
//!       block released                           reason → VERIFICATION_FAILED
//!                                                task stays blocked
//! ```

pub mod events;
pub mod registry;
pub mod types;

pub use events::BlockingEvent;
pub use registry::{SharedBlockingRegistry, TaskBlockingRegistry};
pub use types::{Block, BlockReason, BlockStatus, BlockingSummary, MANUAL_BLOCKER};
