pub mod command;
pub mod environment;
pub mod task_definition;
pub mod task_group;
pub mod task_instance;
pub mod workflow_definition;
pub mod workflow_instance;

#[rustfmt::skip]
pub use {
    command::{Command, CommandType},
    environment::Environment,
    task_definition::{TaskDefinition, TaskType, TimeoutStrategy},
    task_group::{TaskGroup, TaskGroupQueue, TaskGroupQueueStatus},
    task_instance::{Flag, TaskInstance, TaskInstanceStatus},
    workflow_definition::WorkflowDefinition,
    workflow_instance::{WorkflowInstance, WorkflowInstanceStatus},
};
