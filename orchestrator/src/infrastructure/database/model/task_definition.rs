use anyhow::anyhow;
use domain_workflow::model::entity::TaskDefinition;
use num_traits::FromPrimitive;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_definition")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub version: i32,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    pub name: String,
    pub task_type: i32,
    pub params: Json,
    pub worker_group: String,
    pub environment_code: Option<i64>,
    pub max_retry_times: i32,
    pub retry_interval: i64,
    pub task_group_id: Option<Uuid>,
    pub task_group_priority: i32,
    pub priority: i32,
    pub timeout_seconds: Option<i64>,
    pub timeout_strategy: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for TaskDefinition {
    type Error = anyhow::Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            code: model.code,
            version: model.version,
            name: model.name,
            task_type: FromPrimitive::from_i32(model.task_type)
                .ok_or(anyhow!("Wrong task type."))?,
            params: model.params,
            worker_group: model.worker_group,
            environment_code: model.environment_code,
            max_retry_times: model.max_retry_times as u32,
            retry_interval: model.retry_interval as u64,
            task_group_id: model.task_group_id,
            task_group_priority: model.task_group_priority,
            priority: FromPrimitive::from_i32(model.priority)
                .ok_or(anyhow!("Wrong task priority."))?,
            timeout_seconds: model.timeout_seconds.map(|v| v as u64),
            timeout_strategy: FromPrimitive::from_i32(model.timeout_strategy)
                .ok_or(anyhow!("Wrong timeout strategy."))?,
        })
    }
}
