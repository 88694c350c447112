use anyhow::anyhow;
use domain_workflow::model::entity::{WorkflowInstance, WorkflowInstanceStatus};
use domain_workflow::repository::WorkflowInstanceRepo;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::OrmRepo;
use crate::infrastructure::database::model::workflow_instance;

#[async_trait::async_trait]
impl WorkflowInstanceRepo for OrmRepo {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<WorkflowInstance> {
        workflow_instance::Entity::find_by_id(id)
            .one(self.db.get_connection())
            .await?
            .ok_or(anyhow!("No workflow instance with id: {id}"))?
            .try_into()
    }

    async fn insert(&self, instance: &WorkflowInstance) -> anyhow::Result<()> {
        let model = workflow_instance::Model::try_from(instance)?;
        workflow_instance::Entity::insert(model.into_set())
            .exec(self.db.get_connection())
            .await?;
        Ok(())
    }

    async fn update(&self, instance: &WorkflowInstance) -> anyhow::Result<()> {
        let model = workflow_instance::Model::try_from(instance)?;
        workflow_instance::Entity::update(model.into_set())
            .exec(self.db.get_connection())
            .await?;
        Ok(())
    }

    async fn get_unfinished_by_host(&self, host: &str) -> anyhow::Result<Vec<WorkflowInstance>> {
        workflow_instance::Entity::find()
            .filter(workflow_instance::Column::Host.eq(host))
            .filter(
                workflow_instance::Column::Status.is_not_in([
                    WorkflowInstanceStatus::Completed as i32,
                    WorkflowInstanceStatus::Failed as i32,
                    WorkflowInstanceStatus::Killed as i32,
                ]),
            )
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }
}
