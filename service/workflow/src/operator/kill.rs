use std::sync::Arc;

use chrono::Utc;
use domain_workflow::model::entity::TaskInstanceStatus;
use domain_workflow::repository::TaskInstanceRepo;
use typed_builder::TypedBuilder;

use super::TaskOperatorManager;
use crate::runnable::TaskExecutionRunnable;

/// Kill one attempt: durable local `Kill` state first, then a best-effort
/// stop signal to whichever remote holds it. Idempotent on finished
/// attempts.
#[derive(TypedBuilder)]
pub struct KillTaskOperator {
    task_instance_repo: Arc<dyn TaskInstanceRepo>,
    operator_manager: Arc<TaskOperatorManager>,
}

impl KillTaskOperator {
    pub async fn operate(&self, runnable: &TaskExecutionRunnable) -> anyhow::Result<()> {
        let Some(mut instance) = runnable.instance() else {
            return Ok(());
        };
        if instance.status.is_finished() {
            return Ok(());
        }

        instance.status = TaskInstanceStatus::Kill;
        instance.ended_at = Some(Utc::now());
        self.task_instance_repo.update(&instance).await?;
        runnable.update_instance(instance.clone());

        if let Some(host) = instance.host.as_deref() {
            let client = self.operator_manager.client_for(runnable.task_type());
            if let Err(e) = client.kill(host, instance.id).await {
                // The local record already settled the attempt.
                tracing::warn!(
                    task_instance_id = %instance.id,
                    host,
                    error = %e,
                    "kill signal did not reach the remote"
                );
            }
        }
        Ok(())
    }
}
