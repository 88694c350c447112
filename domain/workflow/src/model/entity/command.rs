use std::collections::HashMap;

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::vo::Priority;

/// A pending workflow trigger. The numeric id is the partition key for
/// multi-orchestrator claiming.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Command {
    pub id: i64,
    pub command_type: CommandType,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    /// Set for recovery/failover commands that resume an existing run.
    pub workflow_instance_id: Option<Uuid>,
    pub priority: Priority,
    pub executor_id: Option<Uuid>,
    pub worker_group: Option<String>,
    pub environment_code: Option<i64>,
    /// Run only the subgraph reachable from these nodes when non-empty.
    pub begin_nodes: Vec<String>,
    pub start_params: HashMap<String, String>,
}

#[derive(FromPrimitive, ToPrimitive, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[default]
    StartWorkflow,
    /// Resume a failed run from its failed nodes.
    RecoverFromFailedNodes,
    RecoverFromPause,
    /// Re-own the runs of a dead orchestrator host.
    FailoverWorkflow,
}
