use anyhow::anyhow;
use domain_workflow::model::entity::Command;
use num_traits::FromPrimitive;
use sea_orm::{entity::prelude::*, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "command")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub command_type: i32,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    pub workflow_instance_id: Option<Uuid>,
    pub priority: i32,
    pub executor_id: Option<Uuid>,
    pub worker_group: Option<String>,
    pub environment_code: Option<i64>,
    pub begin_nodes: Json,
    pub start_params: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Command {
    type Error = anyhow::Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            command_type: FromPrimitive::from_i32(model.command_type)
                .ok_or(anyhow!("Wrong command type."))?,
            workflow_definition_code: model.workflow_definition_code,
            workflow_definition_version: model.workflow_definition_version,
            workflow_instance_id: model.workflow_instance_id,
            priority: FromPrimitive::from_i32(model.priority)
                .ok_or(anyhow!("Wrong command priority."))?,
            executor_id: model.executor_id,
            worker_group: model.worker_group,
            environment_code: model.environment_code,
            begin_nodes: serde_json::from_value(model.begin_nodes)?,
            start_params: serde_json::from_value(model.start_params)?,
        })
    }
}

impl TryFrom<&Command> for ActiveModel {
    type Error = anyhow::Error;

    /// Insert shape: the id stays unset so storage assigns it.
    fn try_from(entity: &Command) -> Result<Self, Self::Error> {
        Ok(ActiveModel {
            id: Default::default(),
            command_type: Set(entity.command_type as i32),
            workflow_definition_code: Set(entity.workflow_definition_code),
            workflow_definition_version: Set(entity.workflow_definition_version),
            workflow_instance_id: Set(entity.workflow_instance_id),
            priority: Set(entity.priority as i32),
            executor_id: Set(entity.executor_id),
            worker_group: Set(entity.worker_group.clone()),
            environment_code: Set(entity.environment_code),
            begin_nodes: Set(serde_json::to_value(&entity.begin_nodes)?),
            start_params: Set(serde_json::to_value(&entity.start_params)?),
        })
    }
}
