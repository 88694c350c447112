pub mod dag;
pub mod execution_context;
pub mod msg;
pub mod priority;

#[rustfmt::skip]
pub use {
    dag::{DagEdge, DagNode, WorkflowDag, WorkflowDagBuilder},
    execution_context::TaskExecutionContext,
    priority::{DispatchPriority, Priority},
};
