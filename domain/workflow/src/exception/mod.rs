use thiserror::Error;
use uuid::Uuid;

pub type WorkflowResult<T> = Result<T, WorkflowException>;

#[derive(Error, Debug)]
pub enum WorkflowException {
    #[error("Dag node name must not be empty.")]
    EmptyNodeName,

    #[error("Dag node {name}'s in edge points to {to_node_name} instead of itself.")]
    InEdgeMismatch { name: String, to_node_name: String },

    #[error("Dag node {name}'s out edge leaves from {from_node_name} instead of itself.")]
    OutEdgeMismatch { name: String, from_node_name: String },

    #[error("Duplicated dag node name: {name}.")]
    DuplicatedNodeName { name: String },

    #[error("There is no node named {name} in the dag.")]
    NoSuchNode { name: String },

    #[error("There is no workflow instance with id: {id}.")]
    WorkflowInstanceNotFound { id: Uuid },

    #[error("There is no task instance with id: {id}.")]
    TaskInstanceNotFound { id: Uuid },

    #[error("There is no task group with id: {id}.")]
    TaskGroupNotFound { id: Uuid },

    #[error("Environment with code {code} does not exist.")]
    EnvironmentNotFound { code: i64 },

    #[error("Task transition {transition} is illegal for task instance in status {status}.")]
    IllegalTaskTransition { transition: String, status: String },

    #[error("Workflow internal error: {source}")]
    InternalError {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for WorkflowException {
    fn from(e: anyhow::Error) -> Self {
        WorkflowException::InternalError { source: e }
    }
}
