use std::sync::Arc;
use std::time::Duration;

use service_workflow::{
    CommandFetchService, DispatchTaskOperator, EngineContext, GlobalTaskDispatchWaitingQueue,
    HostFailoverService, KillTaskOperator, PauseTaskOperator, SlotAssignment, TaskDispatchService,
    TaskGroupQueuePoller, TaskGroupSlotService, TaskInstanceFactory, TaskOperatorManager,
    TimeoutTaskOperator, WorkflowEngine,
};
use tokio::sync::watch;

use crate::config::OrchestratorConfig;
use crate::infrastructure::database::Database;
use crate::infrastructure::repository::OrmRepo;
use crate::infrastructure::rpc::{self, LogicTaskOperateClient, WorkerTaskOperateClient};
use crate::infrastructure::worker_registry::ConfigWorkerSelector;

/// Explicit composition root: every collaborator is built once here and
/// threaded through constructors.
pub async fn run(config: OrchestratorConfig) -> anyhow::Result<()> {
    let db = Arc::new(Database::connect(&config.database.url).await?);
    let repo = Arc::new(OrmRepo::builder().db(db).build());

    let http_client = rpc::new_client(&config.http_client)?;
    let operator_manager = Arc::new(
        TaskOperatorManager::builder()
            .worker_client(Arc::new(
                WorkerTaskOperateClient::builder().client(http_client.clone()).build(),
            ))
            .logic_client(Arc::new(
                LogicTaskOperateClient::builder().client(http_client).build(),
            ))
            .build(),
    );

    let dispatch_queue = Arc::new(GlobalTaskDispatchWaitingQueue::new());
    let slot_service = Arc::new(
        TaskGroupSlotService::builder()
            .task_group_repo(repo.clone())
            .queue_repo(repo.clone())
            .build(),
    );
    let factory = Arc::new(
        TaskInstanceFactory::builder()
            .task_instance_repo(repo.clone())
            .environment_repo(repo.clone())
            .build(),
    );

    let ctx = Arc::new(
        EngineContext::builder()
            .workflow_instance_repo(repo.clone())
            .task_instance_repo(repo.clone())
            .environment_repo(repo.clone())
            .task_group_queue_repo(repo.clone())
            .factory(factory)
            .slot_service(slot_service.clone())
            .dispatch_operator(Arc::new(
                DispatchTaskOperator::builder().queue(dispatch_queue.clone()).build(),
            ))
            .kill_operator(Arc::new(
                KillTaskOperator::builder()
                    .task_instance_repo(repo.clone())
                    .operator_manager(operator_manager.clone())
                    .build(),
            ))
            .pause_operator(Arc::new(
                PauseTaskOperator::builder().operator_manager(operator_manager.clone()).build(),
            ))
            .timeout_operator(Arc::new(
                TimeoutTaskOperator::builder()
                    .task_instance_repo(repo.clone())
                    .operator_manager(operator_manager.clone())
                    .build(),
            ))
            .build(),
    );
    let engine = Arc::new(WorkflowEngine::new(ctx));

    let dispatch_service = Arc::new(
        TaskDispatchService::builder()
            .queue(dispatch_queue)
            .worker_selector(Arc::new(ConfigWorkerSelector::new(config.worker_groups.clone())))
            .operator_manager(operator_manager)
            .engine(engine.clone())
            .build(),
    );
    let group_poller = Arc::new(
        TaskGroupQueuePoller::builder()
            .slot_service(slot_service)
            .queue_repo(repo.clone())
            .engine(engine.clone())
            .poll_interval(Duration::from_secs(config.intervals.group_poll_secs))
            .build(),
    );
    let command_service = Arc::new(
        CommandFetchService::builder()
            .command_repo(repo.clone())
            .workflow_definition_repo(repo.clone())
            .workflow_instance_repo(repo.clone())
            .task_instance_repo(repo.clone())
            .engine(engine.clone())
            .assignment(SlotAssignment {
                slot: config.slot.slot,
                total_slots: config.slot.total_slots,
                id_step: config.slot.id_step,
            })
            .host(config.host.clone())
            .poll_interval(Duration::from_secs(config.intervals.command_poll_secs))
            .build(),
    );
    // Owned by the health monitor; constructed here so the sweep is one
    // call away when membership reports a dead peer.
    let _failover_service = HostFailoverService::builder()
        .workflow_instance_repo(repo.clone())
        .command_repo(repo)
        .build();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut joins = tokio::task::JoinSet::new();
    {
        let service = dispatch_service;
        let shutdown = shutdown_rx.clone();
        joins.spawn(async move { service.run(shutdown).await });
    }
    {
        let poller = group_poller.clone();
        let shutdown = shutdown_rx.clone();
        joins.spawn(async move { poller.run_wait_queue(shutdown).await });
    }
    {
        let poller = group_poller;
        let shutdown = shutdown_rx.clone();
        joins.spawn(async move { poller.run_force_start(shutdown).await });
    }
    {
        let service = command_service;
        let shutdown = shutdown_rx.clone();
        joins.spawn(async move { service.run(shutdown).await });
    }
    {
        let engine = engine.clone();
        let interval = Duration::from_secs(config.intervals.timeout_check_secs);
        let shutdown = shutdown_rx;
        joins.spawn(async move { engine.run_timeout_monitor(interval, shutdown).await });
    }

    tracing::info!(host = %config.host, "orchestrator started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    while joins.join_next().await.is_some() {}
    tracing::info!(active = engine.active_count(), "orchestrator stopped");
    Ok(())
}
