use std::sync::Arc;

use chrono::Utc;
use domain_workflow::{
    model::entity::{
        Flag, TaskDefinition, TaskInstance, TaskInstanceStatus, WorkflowInstance,
    },
    repository::{EnvironmentRepo, TaskInstanceRepo},
};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Closed set of attempt transitions. Every variant settles with exactly
/// one `flag = Active` row for the task code and returns that row.
pub enum TaskTransition<'a> {
    /// First attempt of a node: metadata injected from the definition and
    /// the workflow instance, lineage fields reset.
    FirstRun {
        definition: &'a TaskDefinition,
        workflow_instance: &'a WorkflowInstance,
    },
    /// New attempt after a failed one, same lineage.
    Retry { prior: TaskInstance },
    /// New attempt after the prior owner host died. Identical to `Retry`
    /// except the superseded row is restated to `NeedFaultTolerance`.
    Failover { prior: TaskInstance },
    /// New attempt when a failed workflow is resumed from its failed
    /// nodes; the retry budget starts over.
    FailedRecover { prior: TaskInstance },
    /// A paused attempt goes back to the dispatch pipeline in place; it
    /// was never dispatched, so no new row is needed.
    PauseRecover { prior: TaskInstance },
}

/// How a node's first materialization in this engine session is seeded.
/// `Fresh` runs the node from scratch; the recover/failover variants carry
/// the persisted prior attempt the transition works from.
pub enum AttemptSeed {
    Fresh,
    FailedRecover(TaskInstance),
    PauseRecover(TaskInstance),
    Failover(TaskInstance),
}

#[derive(TypedBuilder)]
pub struct TaskInstanceFactory {
    task_instance_repo: Arc<dyn TaskInstanceRepo>,
    environment_repo: Arc<dyn EnvironmentRepo>,
}

impl TaskInstanceFactory {
    /// Apply one transition and return the resulting active attempt.
    pub async fn materialize(&self, transition: TaskTransition<'_>) -> anyhow::Result<TaskInstance> {
        match transition {
            TaskTransition::FirstRun {
                definition,
                workflow_instance,
            } => self.first_run(definition, workflow_instance).await,
            TaskTransition::Retry { prior } => {
                let new = Self::clone_attempt(&prior, prior.retry_times + 1);
                self.supersede(new, prior, None).await
            }
            TaskTransition::Failover { prior } => {
                let new = Self::clone_attempt(&prior, prior.retry_times + 1);
                self.supersede(new, prior, Some(TaskInstanceStatus::NeedFaultTolerance)).await
            }
            TaskTransition::FailedRecover { prior } => {
                let new = Self::clone_attempt(&prior, 0);
                self.supersede(new, prior, None).await
            }
            TaskTransition::PauseRecover { mut prior } => {
                prior.status = TaskInstanceStatus::SubmittedSuccess;
                self.task_instance_repo.update(&prior).await?;
                Ok(prior)
            }
        }
    }

    async fn first_run(
        &self,
        definition: &TaskDefinition,
        workflow_instance: &WorkflowInstance,
    ) -> anyhow::Result<TaskInstance> {
        // Instance override wins, else the definition default.
        let worker_group = workflow_instance
            .worker_group
            .clone()
            .unwrap_or_else(|| definition.worker_group.clone());
        let environment_code = workflow_instance.environment_code.or(definition.environment_code);
        let environment_config = match environment_code {
            Some(code) => self.environment_repo.get_by_code(code).await?.map(|e| e.config),
            None => None,
        };

        let instance = TaskInstance {
            id: Uuid::new_v4(),
            task_code: definition.code,
            task_version: definition.version,
            name: definition.name.clone(),
            task_type: definition.task_type,
            workflow_instance_id: workflow_instance.id,
            status: TaskInstanceStatus::SubmittedSuccess,
            flag: Flag::Active,
            retry_times: 0,
            max_retry_times: definition.max_retry_times,
            host: None,
            execute_path: None,
            log_path: None,
            cache_key: None,
            priority: definition.priority,
            worker_group,
            environment_code,
            environment_config,
            task_group_id: definition.task_group_id,
            task_group_priority: definition.task_group_priority,
            task_params: definition.params.clone(),
            variable_pool: workflow_instance.variable_pool.clone(),
            submitted_at: Some(Utc::now()),
            started_at: None,
            ended_at: None,
        };
        self.task_instance_repo.insert(&instance).await?;
        Ok(instance)
    }

    /// Clone the prior attempt's full field set into a fresh row, clearing
    /// per-attempt lineage. The submit time carries over so the dispatch
    /// ranking keeps the first-submit instant.
    fn clone_attempt(prior: &TaskInstance, retry_times: u32) -> TaskInstance {
        TaskInstance {
            id: Uuid::new_v4(),
            status: TaskInstanceStatus::SubmittedSuccess,
            flag: Flag::Active,
            retry_times,
            host: None,
            execute_path: None,
            log_path: None,
            cache_key: None,
            started_at: None,
            ended_at: None,
            ..prior.clone()
        }
    }

    /// Persist the new attempt and retire the prior row in one
    /// transaction, optionally restating the prior row first.
    async fn supersede(
        &self,
        new: TaskInstance,
        mut prior: TaskInstance,
        prior_status: Option<TaskInstanceStatus>,
    ) -> anyhow::Result<TaskInstance> {
        if let Some(status) = prior_status {
            prior.status = status;
        }
        prior.flag = Flag::Inactive;
        self.task_instance_repo.insert_and_update(&new, &prior).await?;
        Ok(new)
    }
}
