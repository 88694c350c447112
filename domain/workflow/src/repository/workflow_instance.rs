use uuid::Uuid;

use crate::model::entity::WorkflowInstance;

#[async_trait::async_trait]
pub trait WorkflowInstanceRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<WorkflowInstance>;

    async fn insert(&self, instance: &WorkflowInstance) -> anyhow::Result<()>;

    async fn update(&self, instance: &WorkflowInstance) -> anyhow::Result<()>;

    /// Unfinished runs owned by `host`, for the failover sweep.
    async fn get_unfinished_by_host(&self, host: &str) -> anyhow::Result<Vec<WorkflowInstance>>;
}
