use anyhow::{anyhow, Context};
use domain_workflow::model::entity::{Flag, TaskInstance, TaskInstanceStatus};
use domain_workflow::repository::TaskInstanceRepo;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use uuid::Uuid;

use super::OrmRepo;
use crate::infrastructure::database::model::task_instance;

#[async_trait::async_trait]
impl TaskInstanceRepo for OrmRepo {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskInstance> {
        task_instance::Entity::find_by_id(id)
            .one(self.db.get_connection())
            .await?
            .ok_or(anyhow!("No task instance with id: {id}"))?
            .try_into()
    }

    async fn insert(&self, instance: &TaskInstance) -> anyhow::Result<()> {
        let model = task_instance::Model::try_from(instance)?;
        task_instance::Entity::insert(model.into_set())
            .exec(self.db.get_connection())
            .await?;
        Ok(())
    }

    async fn update(&self, instance: &TaskInstance) -> anyhow::Result<()> {
        let model = task_instance::Model::try_from(instance)?;
        task_instance::Entity::update(model.into_set())
            .exec(self.db.get_connection())
            .await?;
        Ok(())
    }

    async fn insert_and_update(
        &self,
        new: &TaskInstance,
        prior: &TaskInstance,
    ) -> anyhow::Result<()> {
        let new_model = task_instance::Model::try_from(new)?;
        let prior_model = task_instance::Model::try_from(prior)?;
        let txn = self
            .db
            .get_connection()
            .begin()
            .await
            .context("task attempt transition begin")?;
        task_instance::Entity::insert(new_model.into_set()).exec(&txn).await?;
        task_instance::Entity::update(prior_model.into_set()).exec(&txn).await?;
        txn.commit().await.context("task attempt transition commit")?;
        Ok(())
    }

    async fn get_active_by_workflow_instance(
        &self,
        workflow_instance_id: Uuid,
    ) -> anyhow::Result<Vec<TaskInstance>> {
        task_instance::Entity::find()
            .filter(task_instance::Column::WorkflowInstanceId.eq(workflow_instance_id))
            .filter(task_instance::Column::Flag.eq(Flag::Active as i32))
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn get_active_by_host(&self, host: &str) -> anyhow::Result<Vec<TaskInstance>> {
        task_instance::Entity::find()
            .filter(task_instance::Column::Host.eq(host))
            .filter(task_instance::Column::Flag.eq(Flag::Active as i32))
            .filter(
                task_instance::Column::Status.is_in([
                    TaskInstanceStatus::Dispatched as i32,
                    TaskInstanceStatus::RunningExecution as i32,
                ]),
            )
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }
}
