//! Execution engine of the workflow orchestrator: attempt factories, the
//! per-instance execution graph, the global dispatch queue, the task group
//! limiter, the operators and the per-workflow event processing.

pub mod command_partition;
pub mod context;
pub mod dispatch_queue;
pub mod engine;
pub mod event_bus;
pub mod execution_graph;
pub mod factory;
pub mod group_limiter;
pub mod operator;
pub mod runnable;

#[rustfmt::skip]
pub use {
    command_partition::{CommandFetchService, HostFailoverService, SlotAssignment},
    context::EngineContext,
    dispatch_queue::{GlobalTaskDispatchWaitingQueue, TaskDispatchService},
    engine::WorkflowEngine,
    event_bus::WorkflowExecutionRunnable,
    execution_graph::WorkflowExecutionGraph,
    factory::{AttemptSeed, TaskInstanceFactory, TaskTransition},
    group_limiter::{TaskGroupQueuePoller, TaskGroupSlotService},
    operator::{
        DispatchTaskOperator, KillTaskOperator, PauseTaskOperator, TaskOperatorManager,
        TimeoutTaskOperator,
    },
    runnable::TaskExecutionRunnable,
};
