use std::sync::Arc;

use domain_workflow::repository::{
    EnvironmentRepo, TaskGroupQueueRepo, TaskInstanceRepo, WorkflowInstanceRepo,
};
use typed_builder::TypedBuilder;

use crate::factory::TaskInstanceFactory;
use crate::group_limiter::TaskGroupSlotService;
use crate::operator::{
    DispatchTaskOperator, KillTaskOperator, PauseTaskOperator, TimeoutTaskOperator,
};

/// Everything the per-workflow event consumers need, built once at startup
/// and threaded through explicitly instead of resolved from a global
/// registry at call time.
#[derive(TypedBuilder)]
pub struct EngineContext {
    pub workflow_instance_repo: Arc<dyn WorkflowInstanceRepo>,
    pub task_instance_repo: Arc<dyn TaskInstanceRepo>,
    pub environment_repo: Arc<dyn EnvironmentRepo>,
    pub task_group_queue_repo: Arc<dyn TaskGroupQueueRepo>,
    pub factory: Arc<TaskInstanceFactory>,
    pub slot_service: Arc<TaskGroupSlotService>,
    pub dispatch_operator: Arc<DispatchTaskOperator>,
    pub kill_operator: Arc<KillTaskOperator>,
    pub pause_operator: Arc<PauseTaskOperator>,
    pub timeout_operator: Arc<TimeoutTaskOperator>,
}
