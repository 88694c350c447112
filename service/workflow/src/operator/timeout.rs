use std::sync::Arc;

use chrono::Utc;
use domain_workflow::model::entity::TaskInstanceStatus;
use domain_workflow::repository::TaskInstanceRepo;
use typed_builder::TypedBuilder;

use super::TaskOperatorManager;
use crate::runnable::TaskExecutionRunnable;

/// End an attempt whose timeout elapsed. Gated by the definition's
/// timeout strategy: only `Failed`/`WarnFailed` end the attempt, and the
/// local `Failure` record lands before the best-effort remote stop.
#[derive(TypedBuilder)]
pub struct TimeoutTaskOperator {
    task_instance_repo: Arc<dyn TaskInstanceRepo>,
    operator_manager: Arc<TaskOperatorManager>,
}

impl TimeoutTaskOperator {
    /// Returns whether the attempt was actually failed.
    pub async fn operate(&self, runnable: &TaskExecutionRunnable) -> anyhow::Result<bool> {
        if !runnable.definition().timeout_strategy.fails_task() {
            return Ok(false);
        }
        let Some(mut instance) = runnable.instance() else {
            return Ok(false);
        };
        if instance.status.is_finished() {
            return Ok(false);
        }

        instance.status = TaskInstanceStatus::Failure;
        instance.ended_at = Some(Utc::now());
        self.task_instance_repo.update(&instance).await?;
        runnable.update_instance(instance.clone());

        if let Some(host) = instance.host.as_deref() {
            let client = self.operator_manager.client_for(runnable.task_type());
            if let Err(e) = client.kill(host, instance.id).await {
                tracing::warn!(
                    task_instance_id = %instance.id,
                    host,
                    error = %e,
                    "timeout stop signal did not reach the remote"
                );
            }
        }
        Ok(true)
    }
}
