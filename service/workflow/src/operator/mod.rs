//! Operators acting on one task runnable. Each action comes in two
//! flavors behind one client trait: regular tasks are operated on the
//! worker owning the attempt's host, logic tasks on the peer master
//! running them in-process. Remote-communication failures never escape an
//! operator; the local record stays authoritative and a later
//! timeout/failover pass reconciles divergence.

mod dispatch;
mod kill;
mod pause;
mod timeout;

use std::sync::Arc;

use domain_workflow::model::entity::TaskType;
use domain_workflow::service::TaskOperateClient;
use typed_builder::TypedBuilder;

#[rustfmt::skip]
pub use {
    dispatch::DispatchTaskOperator,
    kill::KillTaskOperator,
    pause::PauseTaskOperator,
    timeout::TimeoutTaskOperator,
};

/// Selects the executor flavor for a declared task type.
#[derive(TypedBuilder)]
pub struct TaskOperatorManager {
    worker_client: Arc<dyn TaskOperateClient>,
    logic_client: Arc<dyn TaskOperateClient>,
}

impl TaskOperatorManager {
    pub fn client_for(&self, task_type: TaskType) -> &Arc<dyn TaskOperateClient> {
        if task_type.is_logic_task() {
            &self.logic_client
        } else {
            &self.worker_client
        }
    }
}
