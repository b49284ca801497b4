//! ID generation for escalations and human tickets.
//!
//! The engine takes its generator as a dependency, so concurrent tests can
//! each own their counters instead of sharing process-wide state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of escalation and ticket identifiers
pub trait IdGenerator: Send + Sync {
    /// Next escalation ID for `task_id`
    fn next_escalation_id(&self, task_id: &str) -> String;

    /// Next human ticket ID
    fn next_ticket_id(&self) -> String;
}

/// Shared reference to an ID generator
pub type SharedIdGenerator = Arc<dyn IdGenerator>;

/// Monotonic counters producing `ESC-{task}-001` and `HUM-001` style IDs
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    escalations: AtomicU64,
    tickets: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedIdGenerator {
        Arc::new(self)
    }

    /// Restart both counters at 1
    pub fn reset(&self) {
        self.escalations.store(0, Ordering::SeqCst);
        self.tickets.store(0, Ordering::SeqCst);
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_escalation_id(&self, task_id: &str) -> String {
        let seq = self.escalations.fetch_add(1, Ordering::SeqCst) + 1;
        format!("ESC-{}-{:03}", task_id, seq)
    }

    fn next_ticket_id(&self) -> String {
        let seq = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        format!("HUM-{:03}", seq)
    }
}

/// Random IDs for deployments where several processes mint escalations
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_escalation_id(&self, task_id: &str) -> String {
        format!("ESC-{}-{}", task_id, short_uuid())
    }

    fn next_ticket_id(&self) -> String {
        format!("HUM-{}", short_uuid())
    }
}

fn short_uuid() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}
