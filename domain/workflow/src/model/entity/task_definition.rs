use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::vo::Priority;

/// Immutable versioned per-node template.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskDefinition {
    pub code: i64,
    pub version: i32,
    /// Unique node name inside the owning workflow dag.
    pub name: String,
    pub task_type: TaskType,
    /// Task biz params, opaque to the engine.
    pub params: serde_json::Value,
    pub worker_group: String,
    pub environment_code: Option<i64>,
    pub max_retry_times: u32,
    /// Seconds between a failed attempt and its retry.
    pub retry_interval: u64,
    pub task_group_id: Option<Uuid>,
    pub task_group_priority: i32,
    pub priority: Priority,
    pub timeout_seconds: Option<u64>,
    pub timeout_strategy: TimeoutStrategy,
}

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskType {
    #[default]
    Shell,
    Sql,
    Http,
    DataSync,
    /// Runs inside an orchestrator process instead of a worker.
    SubWorkflow,
    Dependent,
    Condition,
}

impl TaskType {
    pub fn is_logic_task(&self) -> bool {
        matches!(self, Self::SubWorkflow | Self::Dependent | Self::Condition)
    }
}

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeoutStrategy {
    /// Alert only, the task keeps running.
    #[default]
    Warn,
    Failed,
    WarnFailed,
}

impl TimeoutStrategy {
    /// Whether an elapsed timeout must end the attempt.
    pub fn fails_task(&self) -> bool {
        matches!(self, Self::Failed | Self::WarnFailed)
    }
}
