use anyhow::anyhow;
use domain_workflow::model::entity::{TaskDefinition, WorkflowDefinition};
use domain_workflow::model::vo::DagEdge;
use domain_workflow::repository::WorkflowDefinitionRepo;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::OrmRepo;
use crate::infrastructure::database::model::{task_definition, task_relation, workflow_definition};

#[async_trait::async_trait]
impl WorkflowDefinitionRepo for OrmRepo {
    async fn get_by_code_version(
        &self,
        code: i64,
        version: i32,
    ) -> anyhow::Result<WorkflowDefinition> {
        workflow_definition::Entity::find_by_id((code, version))
            .one(self.db.get_connection())
            .await?
            .ok_or(anyhow!("No workflow definition with code {code} version {version}"))?
            .try_into()
    }

    async fn get_task_definitions(
        &self,
        code: i64,
        version: i32,
    ) -> anyhow::Result<Vec<TaskDefinition>> {
        task_definition::Entity::find()
            .filter(task_definition::Column::WorkflowDefinitionCode.eq(code))
            .filter(task_definition::Column::WorkflowDefinitionVersion.eq(version))
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn get_task_relations(&self, code: i64, version: i32) -> anyhow::Result<Vec<DagEdge>> {
        Ok(task_relation::Entity::find()
            .filter(task_relation::Column::WorkflowDefinitionCode.eq(code))
            .filter(task_relation::Column::WorkflowDefinitionVersion.eq(version))
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
