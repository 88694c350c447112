use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named capacity pool bounding concurrent task instances across all
/// orchestrator and worker processes. `use_size` is the only cross-process
/// mutable counter in the engine and is moved exclusively by conditional
/// updates at the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskGroup {
    pub id: Uuid,
    pub name: String,
    pub group_size: i32,
    pub use_size: i32,
    pub enabled: bool,
}

/// One row per task instance contending for a group slot.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskGroupQueue {
    /// Monotonic row id; the wait-queue poller pages with `id > last_seen`.
    pub id: i64,
    pub task_group_id: Uuid,
    pub task_instance_id: Uuid,
    pub workflow_instance_id: Uuid,
    pub priority: i32,
    pub status: TaskGroupQueueStatus,
    pub in_queue: bool,
    /// Administrative override: proceed despite a full group. Force-started
    /// rows are excluded from `use_size` accounting.
    pub force_start: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskGroupQueueStatus {
    #[default]
    WaitQueue,
    AcquireSuccess,
}
