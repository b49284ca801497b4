//! Block records and registry snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Blocking id used for manual holds, which have no blocking task
pub const MANUAL_BLOCKER: &str = "manual";

/// Why a task is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    /// A fix task is running against this task's error
    FixInProgress,
    /// An investigation task is gathering context
    InvestigationPending,
    /// The fix ran but did not verify; waiting on the next ladder rung
    VerificationFailed,
    /// Held by an operator
    ManualHold,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixInProgress => write!(f, "FIX_IN_PROGRESS"),
            Self::InvestigationPending => write!(f, "INVESTIGATION_PENDING"),
            Self::VerificationFailed => write!(f, "VERIFICATION_FAILED"),
            Self::ManualHold => write!(f, "MANUAL_HOLD"),
        }
    }
}

/// One reason a task is paused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// The paused task
    pub task_id: String,
    /// The task whose completion releases this block
    pub blocking_task_id: String,
    pub reason: BlockReason,
    /// Released automatically when the blocking task completes
    pub auto_unblock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub fn is_manual(&self) -> bool {
        self.blocking_task_id == MANUAL_BLOCKER
    }
}

/// Blocking picture for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatus {
    pub task_id: String,
    pub is_blocked: bool,
    pub blocked_by: Vec<String>,
    pub blocks: Vec<Block>,
}

/// Registry-wide counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingSummary {
    pub blocked_tasks: usize,
    pub total_blocks: usize,
    pub active_fix_tasks: usize,
    pub by_reason: BTreeMap<BlockReason, usize>,
}

impl std::fmt::Display for BlockingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.total_blocks == 0 {
            return write!(f, "No blocked tasks");
        }
        write!(
            f,
            "{} blocked task(s), {} block(s), {} active fix task(s)",
            self.blocked_tasks, self.total_blocks, self.active_fix_tasks
        )?;
        let reasons = self
            .by_reason
            .iter()
            .map(|(reason, n)| format!("{}={}", reason, n))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, " [{}]", reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_wire_names() {
        let json = serde_json::to_string(&BlockReason::FixInProgress).unwrap();
        assert_eq!(json, "\"FIX_IN_PROGRESS\"");
        let reason: BlockReason = serde_json::from_str("\"VERIFICATION_FAILED\"").unwrap();
        assert_eq!(reason, BlockReason::VerificationFailed);
        assert_eq!(BlockReason::ManualHold.to_string(), "MANUAL_HOLD");
    }

    #[test]
    fn test_summary_display() {
        assert_eq!(BlockingSummary::default().to_string(), "No blocked tasks");

        let mut by_reason = BTreeMap::new();
        by_reason.insert(BlockReason::FixInProgress, 2);
        by_reason.insert(BlockReason::ManualHold, 1);
        let summary = BlockingSummary {
            blocked_tasks: 2,
            total_blocks: 3,
            active_fix_tasks: 2,
            by_reason,
        };
        assert_eq!(
            summary.to_string(),
            "2 blocked task(s), 3 block(s), 2 active fix task(s) [FIX_IN_PROGRESS=2, MANUAL_HOLD=1]"
        );
    }
}
