//! Task-Blocking Registry
//!
//! In-memory index of which tasks are paused and which outstanding work will
//! release them. Two indices are kept in lockstep behind this type:
//!
//! - forward: task → active blocks on it
//! - reverse: blocking task → the task it holds (auto-unblock blocks only)
//!
//! Manual holds carry [`MANUAL_BLOCKER`] as their blocking id and never appear
//! in the reverse index, so they are only cleared by `unblock`/`unblock_all`.
//! A task holds at most one manual hold per reason.
//!
//! A blocking task holds at most one task. Blocking a second task on an id
//! that is still outstanding is refused and the first task stays blocked.

use crate::blocking::events::{BlockingEvent, CHANNEL_CAPACITY};
use crate::blocking::types::{Block, BlockReason, BlockStatus, BlockingSummary, MANUAL_BLOCKER};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Thread-safe registry wrapper
pub type SharedBlockingRegistry = Arc<Mutex<TaskBlockingRegistry>>;

pub struct TaskBlockingRegistry {
    blocks: HashMap<String, Vec<Block>>,
    fix_tasks: HashMap<String, String>,
    sender: broadcast::Sender<BlockingEvent>,
}

impl TaskBlockingRegistry {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            blocks: HashMap::new(),
            fix_tasks: HashMap::new(),
            sender,
        }
    }

    /// Wrap in `Arc<Mutex<_>>` for callers on OS threads
    pub fn shared(self) -> SharedBlockingRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Subscribe to block/unblock notifications
    pub fn subscribe(&self) -> broadcast::Receiver<BlockingEvent> {
        self.sender.subscribe()
    }

    /// Pause `task_id` until `fix_task_id` completes.
    ///
    /// Returns false when the block was refused: `fix_task_id` is the manual
    /// sentinel, or it already holds a different task.
    pub fn block_for_fix(
        &mut self,
        task_id: &str,
        fix_task_id: &str,
        notes: Option<&str>,
    ) -> bool {
        self.insert_block(Block {
            task_id: task_id.to_string(),
            blocking_task_id: fix_task_id.to_string(),
            reason: BlockReason::FixInProgress,
            auto_unblock: true,
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
        })
    }

    /// Pause `task_id` until `investigation_task_id` completes.
    ///
    /// Refused under the same conditions as [`Self::block_for_fix`].
    pub fn block_for_investigation(
        &mut self,
        task_id: &str,
        investigation_task_id: &str,
    ) -> bool {
        self.insert_block(Block {
            task_id: task_id.to_string(),
            blocking_task_id: investigation_task_id.to_string(),
            reason: BlockReason::InvestigationPending,
            auto_unblock: true,
            notes: None,
            created_at: Utc::now(),
        })
    }

    /// Manual hold. Never released automatically.
    ///
    /// A second hold with the same reason replaces the first; holds with
    /// different reasons stack.
    pub fn block_task(&mut self, task_id: &str, reason: BlockReason, notes: Option<&str>) {
        self.insert_block(Block {
            task_id: task_id.to_string(),
            blocking_task_id: MANUAL_BLOCKER.to_string(),
            reason,
            auto_unblock: false,
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
        });
    }

    pub fn is_blocked(&self, task_id: &str) -> bool {
        self.blocks.get(task_id).is_some_and(|b| !b.is_empty())
    }

    /// Remove the block(s) keyed by `(task_id, blocking_task_id)`.
    ///
    /// Returns the number removed. Other blocks on the task stay.
    pub fn unblock(&mut self, task_id: &str, blocking_task_id: &str) -> usize {
        let removed = self.remove_pair(task_id, blocking_task_id, false);
        if removed > 0 {
            info!(task_id, blocking_task_id, "Task unblocked");
            self.publish(BlockingEvent::TaskUnblocked {
                task_id: task_id.to_string(),
                removed,
                still_blocked: self.is_blocked(task_id),
                timestamp: Utc::now(),
            });
        } else {
            debug!(task_id, blocking_task_id, "No matching block to remove");
        }
        removed
    }

    /// Remove every block on `task_id`, returning how many were removed
    pub fn unblock_all(&mut self, task_id: &str) -> usize {
        let Some(blocks) = self.blocks.remove(task_id) else {
            return 0;
        };
        for block in &blocks {
            self.forget_fix_task(&block.blocking_task_id, task_id);
        }

        let removed = blocks.len();
        info!(task_id, removed, "All blocks removed");
        self.publish(BlockingEvent::TaskUnblocked {
            task_id: task_id.to_string(),
            removed,
            still_blocked: false,
            timestamp: Utc::now(),
        });
        removed
    }

    /// Release the auto-unblock block held by `fix_task_id`.
    ///
    /// Returns the released task, or `None` if nothing was waiting on it.
    pub fn fix_task_completed(&mut self, fix_task_id: &str) -> Option<String> {
        let Some(task_id) = self.fix_tasks.get(fix_task_id).cloned() else {
            debug!(fix_task_id, "Completed fix task holds no block");
            return None;
        };

        let removed = self.remove_pair(&task_id, fix_task_id, true);
        self.fix_tasks.remove(fix_task_id);
        let still_blocked = self.is_blocked(&task_id);
        info!(fix_task_id, task_id = %task_id, removed, still_blocked, "Fix task completed");

        self.publish(BlockingEvent::FixCompleted {
            fix_task_id: fix_task_id.to_string(),
            task_id: task_id.clone(),
            still_blocked,
            timestamp: Utc::now(),
        });
        Some(task_id)
    }

    /// Mark the block held by `fix_task_id` as failed verification.
    ///
    /// The task stays blocked so the caller can dispatch the next ladder
    /// rung. Returns the affected task, or `None` if the block is already gone.
    pub fn fix_task_failed(&mut self, fix_task_id: &str) -> Option<String> {
        let task_id = self.fix_tasks.get(fix_task_id).cloned()?;
        let block = self
            .blocks
            .get_mut(&task_id)?
            .iter_mut()
            .find(|b| b.blocking_task_id == fix_task_id)?;
        block.reason = BlockReason::VerificationFailed;

        warn!(fix_task_id, task_id = %task_id, "Fix task failed verification");
        self.publish(BlockingEvent::FixFailed {
            fix_task_id: fix_task_id.to_string(),
            task_id: task_id.clone(),
            timestamp: Utc::now(),
        });
        Some(task_id)
    }

    pub fn get_block_status(&self, task_id: &str) -> BlockStatus {
        let blocks = self.blocks.get(task_id).cloned().unwrap_or_default();
        BlockStatus {
            task_id: task_id.to_string(),
            is_blocked: !blocks.is_empty(),
            blocked_by: blocks.iter().map(|b| b.blocking_task_id.clone()).collect(),
            blocks,
        }
    }

    /// Snapshot of fix task → task it holds
    pub fn get_active_fix_tasks(&self) -> HashMap<String, String> {
        self.fix_tasks.clone()
    }

    /// IDs of every blocked task, sorted
    pub fn blocked_tasks(&self) -> Vec<String> {
        let mut tasks: Vec<String> = self
            .blocks
            .iter()
            .filter(|(_, b)| !b.is_empty())
            .map(|(t, _)| t.clone())
            .collect();
        tasks.sort();
        tasks
    }

    pub fn get_summary(&self) -> BlockingSummary {
        let mut by_reason = BTreeMap::new();
        let mut total_blocks = 0;
        for block in self.blocks.values().flatten() {
            *by_reason.entry(block.reason).or_insert(0) += 1;
            total_blocks += 1;
        }

        BlockingSummary {
            blocked_tasks: self.blocks.values().filter(|b| !b.is_empty()).count(),
            total_blocks,
            active_fix_tasks: self.fix_tasks.len(),
            by_reason,
        }
    }

    /// Drop every block and fix-task mapping.
    ///
    /// Publishes a `TaskUnblocked` for each task that was blocked, in task
    /// order.
    pub fn clear(&mut self) {
        let blocks: BTreeMap<String, Vec<Block>> =
            std::mem::take(&mut self.blocks).into_iter().collect();
        self.fix_tasks.clear();
        debug!(blocked = blocks.len(), "Blocking registry cleared");

        for (task_id, removed) in blocks {
            self.publish(BlockingEvent::TaskUnblocked {
                task_id,
                removed: removed.len(),
                still_blocked: false,
                timestamp: Utc::now(),
            });
        }
    }

    fn insert_block(&mut self, block: Block) -> bool {
        let task_id = block.task_id.clone();
        let blocking_task_id = block.blocking_task_id.clone();

        if block.auto_unblock {
            if blocking_task_id == MANUAL_BLOCKER {
                warn!(task_id = %task_id, "Blocking id is reserved for manual holds, block refused");
                return false;
            }
            if let Some(holder) = self.fix_tasks.get(&blocking_task_id) {
                if *holder != task_id {
                    warn!(
                        blocking_task_id = %blocking_task_id,
                        held_task = %holder,
                        task_id = %task_id,
                        "Blocking task already holds another task, block refused"
                    );
                    return false;
                }
            }
            // Same pair re-blocked: replace rather than stack.
            self.remove_pair(&task_id, &blocking_task_id, false);
            self.fix_tasks.insert(blocking_task_id.clone(), task_id.clone());
        } else if let Some(blocks) = self.blocks.get_mut(&task_id) {
            blocks.retain(|b| !(b.is_manual() && b.reason == block.reason));
        }

        let reason = block.reason;
        self.blocks.entry(task_id.clone()).or_default().push(block);
        info!(task_id = %task_id, blocking_task_id = %blocking_task_id, %reason, "Task blocked");

        self.publish(BlockingEvent::TaskBlocked {
            task_id,
            blocking_task_id,
            reason,
            timestamp: Utc::now(),
        });
        true
    }

    /// Remove blocks matching the pair and keep the reverse index in step.
    fn remove_pair(&mut self, task_id: &str, blocking_task_id: &str, auto_only: bool) -> usize {
        let Some(blocks) = self.blocks.get_mut(task_id) else {
            return 0;
        };
        let before = blocks.len();
        blocks.retain(|b| {
            !(b.blocking_task_id == blocking_task_id && (!auto_only || b.auto_unblock))
        });
        let removed = before - blocks.len();
        if blocks.is_empty() {
            self.blocks.remove(task_id);
        }
        if removed > 0 {
            self.forget_fix_task(blocking_task_id, task_id);
        }
        removed
    }

    fn forget_fix_task(&mut self, blocking_task_id: &str, task_id: &str) {
        if self.fix_tasks.get(blocking_task_id).map(String::as_str) == Some(task_id) {
            self.fix_tasks.remove(blocking_task_id);
        }
    }

    fn publish(&self, event: BlockingEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
    }

    /// Check the forward and reverse indices agree
    #[cfg(test)]
    fn indices_consistent(&self) -> bool {
        use std::collections::HashSet;

        let forward: HashSet<(String, String)> = self
            .blocks
            .values()
            .flatten()
            .filter(|b| b.auto_unblock)
            .map(|b| (b.blocking_task_id.clone(), b.task_id.clone()))
            .collect();
        let reverse: HashSet<(String, String)> = self
            .fix_tasks
            .iter()
            .map(|(f, t)| (f.clone(), t.clone()))
            .collect();
        forward == reverse
    }
}

impl Default for TaskBlockingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
