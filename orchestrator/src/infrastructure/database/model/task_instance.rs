use anyhow::anyhow;
use domain_workflow::model::entity::TaskInstance;
use num_traits::FromPrimitive;
use sea_orm::{entity::prelude::*, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_instance")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub task_code: i64,
    pub task_version: i32,
    pub name: String,
    pub task_type: i32,
    pub workflow_instance_id: Uuid,
    pub status: i32,
    pub flag: i32,
    pub retry_times: i32,
    pub max_retry_times: i32,
    pub host: Option<String>,
    pub execute_path: Option<String>,
    pub log_path: Option<String>,
    pub cache_key: Option<String>,
    pub priority: i32,
    pub worker_group: String,
    pub environment_code: Option<i64>,
    pub environment_config: Option<String>,
    pub task_group_id: Option<Uuid>,
    pub task_group_priority: i32,
    pub task_params: Json,
    pub variable_pool: Json,
    pub submitted_at: Option<DateTimeUtc>,
    pub started_at: Option<DateTimeUtc>,
    pub ended_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for TaskInstance {
    type Error = anyhow::Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            task_code: model.task_code,
            task_version: model.task_version,
            name: model.name,
            task_type: FromPrimitive::from_i32(model.task_type)
                .ok_or(anyhow!("Wrong task type."))?,
            workflow_instance_id: model.workflow_instance_id,
            status: FromPrimitive::from_i32(model.status)
                .ok_or(anyhow!("Wrong task instance status."))?,
            flag: FromPrimitive::from_i32(model.flag).ok_or(anyhow!("Wrong task flag."))?,
            retry_times: model.retry_times as u32,
            max_retry_times: model.max_retry_times as u32,
            host: model.host,
            execute_path: model.execute_path,
            log_path: model.log_path,
            cache_key: model.cache_key,
            priority: FromPrimitive::from_i32(model.priority)
                .ok_or(anyhow!("Wrong task priority."))?,
            worker_group: model.worker_group,
            environment_code: model.environment_code,
            environment_config: model.environment_config,
            task_group_id: model.task_group_id,
            task_group_priority: model.task_group_priority,
            task_params: model.task_params,
            variable_pool: serde_json::from_value(model.variable_pool)?,
            submitted_at: model.submitted_at,
            started_at: model.started_at,
            ended_at: model.ended_at,
        })
    }
}

impl TryFrom<&TaskInstance> for Model {
    type Error = anyhow::Error;

    fn try_from(entity: &TaskInstance) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            task_code: entity.task_code,
            task_version: entity.task_version,
            name: entity.name.clone(),
            task_type: entity.task_type as i32,
            workflow_instance_id: entity.workflow_instance_id,
            status: entity.status as i32,
            flag: entity.flag as i32,
            retry_times: entity.retry_times as i32,
            max_retry_times: entity.max_retry_times as i32,
            host: entity.host.clone(),
            execute_path: entity.execute_path.clone(),
            log_path: entity.log_path.clone(),
            cache_key: entity.cache_key.clone(),
            priority: entity.priority as i32,
            worker_group: entity.worker_group.clone(),
            environment_code: entity.environment_code,
            environment_config: entity.environment_config.clone(),
            task_group_id: entity.task_group_id,
            task_group_priority: entity.task_group_priority,
            task_params: entity.task_params.clone(),
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
            task_code: Set(self.task_code),
            task_version: Set(self.task_version),
            name: Set(self.name),
            task_type: Set(self.task_type),
            workflow_instance_id: Set(self.workflow_instance_id),
            status: Set(self.status),
            flag: Set(self.flag),
            retry_times: Set(self.retry_times),
            max_retry_times: Set(self.max_retry_times),
            host: Set(self.host),
            execute_path: Set(self.execute_path),
            log_path: Set(self.log_path),
            cache_key: Set(self.cache_key),
            priority: Set(self.priority),
            worker_group: Set(self.worker_group),
            environment_code: Set(self.environment_code),
            environment_config: Set(self.environment_config),
            task_group_id: Set(self.task_group_id),
            task_group_priority: Set(self.task_group_priority),
            task_params: Set(self.task_params),
            variable_pool: Set(self.variable_pool),
            submitted_at: Set(self.submitted_at),
            started_at: Set(self.started_at),
            ended_at: Set(self.ended_at),
        }
    }
}
