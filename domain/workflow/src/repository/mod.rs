mod command;
mod environment;
mod task_group;
mod task_instance;
mod workflow_definition;
mod workflow_instance;

#[rustfmt::skip]
pub use {
    command::CommandRepo,
    environment::EnvironmentRepo,
    task_group::TaskGroupQueueRepo,
    task_group::TaskGroupRepo,
    task_instance::TaskInstanceRepo,
    workflow_definition::WorkflowDefinitionRepo,
    workflow_instance::WorkflowInstanceRepo,
};
