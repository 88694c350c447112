use serde::{Deserialize, Serialize};

use crate::model::entity::{
    Environment, TaskDefinition, TaskInstance, WorkflowDefinition, WorkflowInstance,
};

/// Everything a remote executor needs to run one attempt, snapshotted at
/// attempt-creation time so dispatch needs no further storage calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecutionContext {
    pub workflow_definition: WorkflowDefinition,
    pub workflow_instance: WorkflowInstance,
    pub task_definition: TaskDefinition,
    pub task_instance: TaskInstance,
    pub environment: Option<Environment>,
}
