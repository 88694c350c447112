use std::sync::Arc;

use typed_builder::TypedBuilder;

use crate::dispatch_queue::GlobalTaskDispatchWaitingQueue;
use crate::runnable::TaskExecutionRunnable;

/// Dispatch hands the runnable to the global waiting queue instead of
/// acting immediately, decoupling "ready to dispatch" from "sent".
#[derive(TypedBuilder)]
pub struct DispatchTaskOperator {
    queue: Arc<GlobalTaskDispatchWaitingQueue>,
}

impl DispatchTaskOperator {
    pub fn operate(&self, runnable: Arc<TaskExecutionRunnable>) -> anyhow::Result<()> {
        self.queue.submit(runnable)
    }
}
