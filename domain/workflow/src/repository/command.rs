use crate::model::entity::Command;

#[async_trait::async_trait]
pub trait CommandRepo: Send + Sync {
    /// Enqueue a trigger; storage assigns the id.
    async fn insert(&self, command: &Command) -> anyhow::Result<()>;

    /// Oldest pending commands with `id > last_seen_id`, ordered by id.
    /// Slot filtering happens in the caller; partitions are disjoint so no
    /// cross-process lock is involved.
    async fn fetch_page(&self, last_seen_id: i64, limit: u64) -> anyhow::Result<Vec<Command>>;

    /// Delete a consumed command. `false` when the row was already gone.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}
