use std::collections::HashMap;

use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task_definition::TaskType;
use crate::model::vo::Priority;

/// One attempt of one task code within one workflow instance.
///
/// Exactly one row per task code carries `flag = Active` at any settled
/// point; the factories create and deactivate rows to keep it that way.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskInstance {
    pub id: Uuid,
    pub task_code: i64,
    pub task_version: i32,
    pub name: String,
    pub task_type: TaskType,
    pub workflow_instance_id: Uuid,
    pub status: TaskInstanceStatus,
    pub flag: Flag,
    pub retry_times: u32,
    pub max_retry_times: u32,
    pub host: Option<String>,
    pub execute_path: Option<String>,
    pub log_path: Option<String>,
    pub cache_key: Option<String>,
    pub priority: Priority,
    pub worker_group: String,
    pub environment_code: Option<i64>,
    /// Environment config resolved from storage at first-run time.
    pub environment_config: Option<String>,
    pub task_group_id: Option<Uuid>,
    pub task_group_priority: i32,
    pub task_params: serde_json::Value,
    pub variable_pool: HashMap<String, String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskInstanceStatus {
    /// Persisted and ready to enter the dispatch pipeline.
    #[default]
    SubmittedSuccess,
    /// Sent to a remote executor, no running ack yet.
    Dispatched,
    RunningExecution,
    Paused,
    Success,
    Failure,
    Kill,
    /// The attempt's owner died; a failover attempt supersedes this row.
    NeedFaultTolerance,
}

impl TaskInstanceStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failure | Self::Kill | Self::NeedFaultTolerance
        )
    }
}

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Flag {
    #[default]
    Active,
    Inactive,
}

impl TaskInstance {
    pub fn needs_retry(&self) -> bool {
        self.retry_times < self.max_retry_times
    }
}
