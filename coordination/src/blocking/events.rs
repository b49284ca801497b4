//! Notifications published by the blocking registry

use crate::blocking::types::BlockReason;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel capacity for broadcast
pub const CHANNEL_CAPACITY: usize = 256;

/// Registry state changes, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockingEvent {
    /// A block was added to a task
    TaskBlocked {
        task_id: String,
        blocking_task_id: String,
        reason: BlockReason,
        timestamp: DateTime<Utc>,
    },

    /// Blocks were removed from a task by hand
    TaskUnblocked {
        task_id: String,
        removed: usize,
        still_blocked: bool,
        timestamp: DateTime<Utc>,
    },

    /// A fix task finished and released its block
    FixCompleted {
        fix_task_id: String,
        task_id: String,
        still_blocked: bool,
        timestamp: DateTime<Utc>,
    },

    /// A fix task finished without verifying; the task stays blocked
    FixFailed {
        fix_task_id: String,
        task_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl BlockingEvent {
    /// Event type name as it appears on the wire
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TaskBlocked { .. } => "TASK_BLOCKED",
            Self::TaskUnblocked { .. } => "TASK_UNBLOCKED",
            Self::FixCompleted { .. } => "FIX_COMPLETED",
            Self::FixFailed { .. } => "FIX_FAILED",
        }
    }

    /// The paused task this event concerns
    pub fn task_id(&self) -> &str {
        match self {
            Self::TaskBlocked { task_id, .. }
            | Self::TaskUnblocked { task_id, .. }
            | Self::FixCompleted { task_id, .. }
            | Self::FixFailed { task_id, .. } => task_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::TaskBlocked { timestamp, .. }
            | Self::TaskUnblocked { timestamp, .. }
            | Self::FixCompleted { timestamp, .. }
            | Self::FixFailed { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let now = Utc::now();
        let event = BlockingEvent::FixCompleted {
            fix_task_id: "fix-1".to_string(),
            task_id: "task-1".to_string(),
            still_blocked: false,
            timestamp: now,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"FIX_COMPLETED\""), "JSON: {json}");

        let roundtrip: BlockingEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, event);
        assert_eq!(roundtrip.event_type(), "FIX_COMPLETED");
        assert_eq!(roundtrip.task_id(), "task-1");
        assert_eq!(roundtrip.timestamp(), now);
    }
}
