use std::sync::Arc;

use typed_builder::TypedBuilder;

use super::TaskOperatorManager;
use crate::runnable::TaskExecutionRunnable;

/// Pause is a best-effort remote notify with no local mutation; the task
/// reports its own paused state through the usual callback path.
#[derive(TypedBuilder)]
pub struct PauseTaskOperator {
    operator_manager: Arc<TaskOperatorManager>,
}

impl PauseTaskOperator {
    pub async fn operate(&self, runnable: &TaskExecutionRunnable) -> anyhow::Result<()> {
        let Some(instance) = runnable.instance() else {
            return Ok(());
        };
        if instance.status.is_finished() {
            return Ok(());
        }
        let Some(host) = instance.host.as_deref() else {
            return Ok(());
        };
        let client = self.operator_manager.client_for(runnable.task_type());
        if let Err(e) = client.pause(host, instance.id).await {
            tracing::warn!(
                task_instance_id = %instance.id,
                host,
                error = %e,
                "pause signal did not reach the remote"
            );
        }
        Ok(())
    }
}
