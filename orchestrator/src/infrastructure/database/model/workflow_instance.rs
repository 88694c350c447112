use anyhow::anyhow;
use domain_workflow::model::entity::WorkflowInstance;
use num_traits::FromPrimitive;
use sea_orm::{entity::prelude::*, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "workflow_instance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    pub status: i32,
    pub priority: i32,
    pub executor_id: Option<Uuid>,
    pub host: Option<String>,
    pub worker_group: Option<String>,
    pub environment_code: Option<i64>,
    pub variable_pool: Json,
    pub submitted_at: Option<DateTimeUtc>,
    pub started_at: Option<DateTimeUtc>,
    pub ended_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for WorkflowInstance {
    type Error = anyhow::Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            workflow_definition_code: model.workflow_definition_code,
            workflow_definition_version: model.workflow_definition_version,
            status: FromPrimitive::from_i32(model.status)
                .ok_or(anyhow!("Wrong workflow instance status."))?,
            priority: FromPrimitive::from_i32(model.priority)
                .ok_or(anyhow!("Wrong workflow instance priority."))?,
            executor_id: model.executor_id,
            host: model.host,
            worker_group: model.worker_group,
            environment_code: model.environment_code,
            variable_pool: serde_json::from_value(model.variable_pool)?,
            submitted_at: model.submitted_at,
            started_at: model.started_at,
            ended_at: model.ended_at,
        })
    }
}

impl TryFrom<&WorkflowInstance> for Model {
    type Error = anyhow::Error;

    fn try_from(entity: &WorkflowInstance) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            name: entity.name.clone(),
            workflow_definition_code: entity.workflow_definition_code,
            workflow_definition_version: entity.workflow_definition_version,
            status: entity.status as i32,
            priority: entity.priority as i32,
            executor_id: entity.executor_id,
            host: entity.host.clone(),
            worker_group: entity.worker_group.clone(),
            environment_code: entity.environment_code,
            variable_pool: serde_json::to_value(&entity.variable_pool)?,
            submitted_at: entity.submitted_at,
            started_at: entity.started_at,
            ended_at: entity.ended_at,
        })
    }
}

impl Model {
    pub fn into_set(self) -> ActiveModel {
        ActiveModel {
            id: Set(self.id),
            name: Set(self.name),
            workflow_definition_code: Set(self.workflow_definition_code),
            workflow_definition_version: Set(self.workflow_definition_version),
            status: Set(self.status),
            priority: Set(self.priority),
            executor_id: Set(self.executor_id),
            host: Set(self.host),
            worker_group: Set(self.worker_group),
            environment_code: Set(self.environment_code),
            variable_pool: Set(self.variable_pool),
            submitted_at: Set(self.submitted_at),
            started_at: Set(self.started_at),
            ended_at: Set(self.ended_at),
        }
    }
}
