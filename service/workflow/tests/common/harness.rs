use std::sync::Arc;

use domain_workflow::mock::MockTaskOperateClient;
use service_workflow::{
    DispatchTaskOperator, EngineContext, GlobalTaskDispatchWaitingQueue, KillTaskOperator,
    PauseTaskOperator, TaskGroupSlotService, TaskInstanceFactory, TaskOperatorManager,
    TimeoutTaskOperator, WorkflowEngine,
};

use super::InMemoryStore;

pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub engine: Arc<WorkflowEngine>,
    pub queue: Arc<GlobalTaskDispatchWaitingQueue>,
}

/// Full engine wiring over the in-memory fakes, with remote clients that
/// expect to never be called.
pub fn harness() -> TestHarness {
    let store = Arc::new(InMemoryStore::new());
    let queue = Arc::new(GlobalTaskDispatchWaitingQueue::new());
    let operator_manager = Arc::new(
        TaskOperatorManager::builder()
            .worker_client(Arc::new(MockTaskOperateClient::new()))
            .logic_client(Arc::new(MockTaskOperateClient::new()))
            .build(),
    );
    let ctx = Arc::new(
        EngineContext::builder()
            .workflow_instance_repo(store.clone())
            .task_instance_repo(store.clone())
            .environment_repo(store.clone())
            .task_group_queue_repo(store.clone())
            .factory(Arc::new(
                TaskInstanceFactory::builder()
                    .task_instance_repo(store.clone())
                    .environment_repo(store.clone())
                    .build(),
            ))
            .slot_service(Arc::new(
                TaskGroupSlotService::builder()
                    .task_group_repo(store.clone())
                    .queue_repo(store.clone())
                    .build(),
            ))
            .dispatch_operator(Arc::new(
                DispatchTaskOperator::builder().queue(queue.clone()).build(),
            ))
            .kill_operator(Arc::new(
                KillTaskOperator::builder()
                    .task_instance_repo(store.clone())
                    .operator_manager(operator_manager.clone())
                    .build(),
            ))
            .pause_operator(Arc::new(
                PauseTaskOperator::builder().operator_manager(operator_manager.clone()).build(),
            ))
            .timeout_operator(Arc::new(
                TimeoutTaskOperator::builder()
                    .task_instance_repo(store.clone())
                    .operator_manager(operator_manager)
                    .build(),
            ))
            .build(),
    );
    TestHarness {
        store: store.clone(),
        engine: Arc::new(WorkflowEngine::new(ctx)),
        queue,
    }
}
