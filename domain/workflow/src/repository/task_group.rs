use uuid::Uuid;

use crate::model::entity::{TaskGroup, TaskGroupQueue};

#[async_trait::async_trait]
pub trait TaskGroupRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskGroup>;

    /// Single conditional update: `use_size + 1 WHERE use_size <
    /// group_size AND enabled`. `false` means the group was full (or the
    /// race was lost) and the caller stays queued.
    async fn try_acquire_slot(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Symmetric release: `use_size - 1 WHERE use_size > 0`.
    async fn try_release_slot(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait::async_trait]
pub trait TaskGroupQueueRepo: Send + Sync {
    /// Insert and return the row with its storage-assigned id.
    async fn insert(&self, row: &TaskGroupQueue) -> anyhow::Result<TaskGroupQueue>;

    async fn update(&self, row: &TaskGroupQueue) -> anyhow::Result<()>;

    async fn get_by_task_instance(
        &self,
        task_instance_id: Uuid,
    ) -> anyhow::Result<Option<TaskGroupQueue>>;

    /// Keyset page of still-queued rows: `in_queue AND id > last_seen`,
    /// ordered by id, `limit` rows. The poller re-ranks each page by
    /// priority before attempting acquisition.
    async fn get_waiting_page(
        &self,
        last_seen_id: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<TaskGroupQueue>>;

    /// Queued rows flagged `force_start`, same keyset contract.
    async fn get_force_start_page(
        &self,
        last_seen_id: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<TaskGroupQueue>>;

    /// Remove one row once its owning task instance finished.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;

    /// Bulk cleanup when a workflow instance is finalized.
    async fn delete_by_workflow_instance(&self, workflow_instance_id: Uuid)
        -> anyhow::Result<u64>;
}
