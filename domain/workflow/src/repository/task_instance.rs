use uuid::Uuid;

use crate::model::entity::TaskInstance;

#[async_trait::async_trait]
pub trait TaskInstanceRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskInstance>;

    async fn insert(&self, instance: &TaskInstance) -> anyhow::Result<()>;

    async fn update(&self, instance: &TaskInstance) -> anyhow::Result<()>;

    /// Persist a new attempt and its predecessor in one transaction. The
    /// predecessor arrives already deactivated (and restated, for
    /// failover); both writes commit or neither does.
    async fn insert_and_update(
        &self,
        new: &TaskInstance,
        prior: &TaskInstance,
    ) -> anyhow::Result<()>;

    /// Active attempts of one workflow instance, any state.
    async fn get_active_by_workflow_instance(
        &self,
        workflow_instance_id: Uuid,
    ) -> anyhow::Result<Vec<TaskInstance>>;

    /// Active attempts last dispatched to `host`, for the failover sweep.
    async fn get_active_by_host(&self, host: &str) -> anyhow::Result<Vec<TaskInstance>>;
}
