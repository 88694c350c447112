use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event on one workflow instance's bus. Processed strictly in arrival
/// order by that instance's single consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    /// Start (or resume) scheduling the instance.
    Trigger,
    Pause,
    Kill,
    /// Tear the in-memory runnable down. Idempotent.
    Finalize,
    /// A task group slot was granted to a queued task.
    SlotAcquired { task_instance_id: Uuid },
    /// Periodic probe from the timeout monitor; the consumer inspects its
    /// in-flight attempts against their timeout strategy.
    TimeoutCheck,
    /// Raised internally once a failed attempt's retry interval elapsed.
    RetryTask { task_code: i64 },
    TaskStateChange {
        task_code: i64,
        change: TaskStateChange,
    },
}

/// State transition reported for one task attempt, either by a remote
/// executor callback or raised internally by the operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskStateChange {
    Dispatched { host: String },
    Running,
    Succeeded {
        variable_pool: HashMap<String, String>,
    },
    Failed { message: Option<String> },
    Killed,
    Paused,
    TimedOut,
    /// Log/execute path bookkeeping sent while the task runs.
    InfoUpdated {
        execute_path: Option<String>,
        log_path: Option<String>,
    },
}

/// Wire payload of a worker execution-event callback; the engine routes it
/// onto the owning instance's bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecutionEventMsg {
    pub workflow_instance_id: Uuid,
    pub task_code: i64,
    pub change: TaskStateChange,
}
