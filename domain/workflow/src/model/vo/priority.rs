use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

/// Workflow/task instance priority. Lower code wins the dispatch race, so
/// the derived order already matches the ranking.
#[derive(
    FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Priority {
    Highest,
    High,
    #[default]
    Medium,
    Low,
    Lowest,
}

/// Immutable ranking snapshot taken when a task enters the dispatch
/// pipeline. Everywhere runnables are ranked they are ranked by this total
/// order:
///
/// 1. workflow instance priority, lower code first;
/// 2. task instance priority, lower code first;
/// 3. task group priority, higher number first;
/// 4. first submit time, earlier first.
///
/// `Ord` sorts in dispatch order, so the natural minimum is the next
/// runnable to leave the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPriority {
    pub workflow_priority: Priority,
    pub task_priority: Priority,
    pub group_priority: i32,
    pub submitted_at: DateTime<Utc>,
}

impl Ord for DispatchPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.workflow_priority
            .cmp(&other.workflow_priority)
            .then_with(|| self.task_priority.cmp(&other.task_priority))
            .then_with(|| other.group_priority.cmp(&self.group_priority))
            .then_with(|| self.submitted_at.cmp(&other.submitted_at))
    }
}

impl PartialOrd for DispatchPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn key(w: Priority, t: Priority, g: i32, secs: i64) -> DispatchPriority {
        DispatchPriority {
            workflow_priority: w,
            task_priority: t,
            group_priority: g,
            submitted_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn workflow_priority_dominates() {
        assert!(key(Priority::High, Priority::Lowest, 0, 9) < key(Priority::Medium, Priority::Highest, 9, 0));
    }

    #[test]
    fn task_priority_breaks_workflow_tie() {
        assert!(key(Priority::Medium, Priority::High, 0, 9) < key(Priority::Medium, Priority::Low, 9, 0));
    }

    #[test]
    fn higher_group_priority_wins() {
        assert!(key(Priority::Medium, Priority::Medium, 5, 9) < key(Priority::Medium, Priority::Medium, 1, 0));
    }

    #[test]
    fn earlier_submit_breaks_full_tie() {
        assert!(key(Priority::Medium, Priority::Medium, 3, 1) < key(Priority::Medium, Priority::Medium, 3, 2));
    }
}
