use uuid::Uuid;

use crate::model::vo::TaskExecutionContext;

/// Typed task-operation requests to one remote executor flavor: the
/// worker-side operator for regular tasks, the peer-master operator for
/// logic tasks. Wire encoding and transport live behind the impl.
#[async_trait::async_trait]
pub trait TaskOperateClient: Send + Sync {
    /// Hand an attempt to `host` for execution.
    async fn dispatch(&self, host: &str, context: &TaskExecutionContext) -> anyhow::Result<()>;

    /// Best-effort stop signal for an attempt already marked killed here.
    async fn kill(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()>;

    /// Best-effort pause signal; the task reports its own paused state.
    async fn pause(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()>;
}
