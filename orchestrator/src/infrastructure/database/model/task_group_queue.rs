use anyhow::anyhow;
use domain_workflow::model::entity::{TaskGroupQueue, TaskGroupQueueStatus};
use num_traits::FromPrimitive;
use sea_orm::{entity::prelude::*, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_group_queue")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub task_group_id: Uuid,
    pub task_instance_id: Uuid,
    pub workflow_instance_id: Uuid,
    pub priority: i32,
    pub status: i32,
    pub in_queue: bool,
    pub force_start: bool,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for TaskGroupQueue {
    type Error = anyhow::Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            task_group_id: model.task_group_id,
            task_instance_id: model.task_instance_id,
            workflow_instance_id: model.workflow_instance_id,
            priority: model.priority,
            status: FromPrimitive::from_i32(model.status)
                .ok_or(anyhow!("Wrong task group queue status."))?,
            in_queue: model.in_queue,
            force_start: model.force_start,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl Model {
    pub fn update_set(row: &TaskGroupQueue) -> ActiveModel {
        ActiveModel {
            id: Set(row.id),
            task_group_id: Set(row.task_group_id),
            task_instance_id: Set(row.task_instance_id),
            workflow_instance_id: Set(row.workflow_instance_id),
            priority: Set(row.priority),
            status: Set(row.status as i32),
            in_queue: Set(row.in_queue),
            force_start: Set(row.force_start),
            created_at: Set(row.created_at),
            updated_at: Set(row.updated_at),
        }
    }
}

impl From<&TaskGroupQueue> for ActiveModel {
    /// Insert shape: the id stays unset so storage assigns it.
    fn from(row: &TaskGroupQueue) -> Self {
        ActiveModel {
            id: Default::default(),
            task_group_id: Set(row.task_group_id),
            task_instance_id: Set(row.task_instance_id),
            workflow_instance_id: Set(row.workflow_instance_id),
            priority: Set(row.priority),
            status: Set(row.status as i32),
            in_queue: Set(row.in_queue),
            force_start: Set(row.force_start),
            created_at: Set(row.created_at),
            updated_at: Set(row.updated_at),
        }
    }
}
