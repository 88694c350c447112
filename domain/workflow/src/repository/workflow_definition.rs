use crate::model::entity::{TaskDefinition, WorkflowDefinition};
use crate::model::vo::DagEdge;

#[async_trait::async_trait]
pub trait WorkflowDefinitionRepo: Send + Sync {
    async fn get_by_code_version(
        &self,
        code: i64,
        version: i32,
    ) -> anyhow::Result<WorkflowDefinition>;

    async fn get_task_definitions(
        &self,
        code: i64,
        version: i32,
    ) -> anyhow::Result<Vec<TaskDefinition>>;

    /// Precedence relations between node names, the raw material of the
    /// dag builder.
    async fn get_task_relations(&self, code: i64, version: i32) -> anyhow::Result<Vec<DagEdge>>;
}
