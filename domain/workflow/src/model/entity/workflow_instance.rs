use std::collections::HashMap;

use chrono::{DateTime, Utc};
use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::vo::Priority;

/// One run of a workflow definition. Mutated only through its own event
/// bus; the database row outlives the in-memory runnable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkflowInstance {
    pub id: Uuid,
    pub name: String,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    pub status: WorkflowInstanceStatus,
    pub priority: Priority,
    /// User that triggered the run.
    pub executor_id: Option<Uuid>,
    /// Orchestrator host owning the run.
    pub host: Option<String>,
    /// Instance-level override; falls back to the task definition.
    pub worker_group: Option<String>,
    /// Instance-level override; falls back to the task definition.
    pub environment_code: Option<i64>,
    pub variable_pool: HashMap<String, String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WorkflowInstanceStatus {
    #[default]
    Created,
    Running,
    Pausing,
    Paused,
    Killing,
    Killed,
    Completed,
    Failed,
}

impl WorkflowInstanceStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Killed | Self::Completed | Self::Failed)
    }

    /// Pausing/killing runs refuse new task attempts.
    pub fn accepts_new_attempts(&self) -> bool {
        matches!(self, Self::Created | Self::Running)
    }
}

impl WorkflowInstance {
    pub fn merge_variable_pool(&mut self, vars: &HashMap<String, String>) {
        for (k, v) in vars {
            self.variable_pool.insert(k.clone(), v.clone());
        }
    }
}
