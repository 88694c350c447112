use anyhow::anyhow;
use domain_workflow::model::entity::{TaskGroup, TaskGroupQueue, TaskGroupQueueStatus};
use domain_workflow::repository::{TaskGroupQueueRepo, TaskGroupRepo};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use super::OrmRepo;
use crate::infrastructure::database::model::{task_group, task_group_queue};

#[async_trait::async_trait]
impl TaskGroupRepo for OrmRepo {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskGroup> {
        Ok(task_group::Entity::find_by_id(id)
            .one(self.db.get_connection())
            .await?
            .ok_or(anyhow!("No task group with id: {id}"))?
            .into())
    }

    /// `UPDATE task_group SET use_size = use_size + 1 WHERE id = ? AND
    /// enabled AND use_size < group_size` — one conditional statement, so
    /// concurrent acquirers across processes cannot oversubscribe.
    async fn try_acquire_slot(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = task_group::Entity::update_many()
            .col_expr(
                task_group::Column::UseSize,
                Expr::col(task_group::Column::UseSize).add(1),
            )
            .filter(task_group::Column::Id.eq(id))
            .filter(task_group::Column::Enabled.eq(true))
            .filter(
                Expr::col(task_group::Column::UseSize)
                    .lt(Expr::col(task_group::Column::GroupSize)),
            )
            .exec(self.db.get_connection())
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn try_release_slot(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = task_group::Entity::update_many()
            .col_expr(
                task_group::Column::UseSize,
                Expr::col(task_group::Column::UseSize).sub(1),
            )
            .filter(task_group::Column::Id.eq(id))
            .filter(Expr::col(task_group::Column::UseSize).gt(0))
            .exec(self.db.get_connection())
            .await?;
        Ok(result.rows_affected == 1)
    }
}

#[async_trait::async_trait]
impl TaskGroupQueueRepo for OrmRepo {
    async fn insert(&self, row: &TaskGroupQueue) -> anyhow::Result<TaskGroupQueue> {
        let result = task_group_queue::Entity::insert(task_group_queue::ActiveModel::from(row))
            .exec(self.db.get_connection())
            .await?;
        let mut inserted = row.clone();
        inserted.id = result.last_insert_id;
        Ok(inserted)
    }

    async fn update(&self, row: &TaskGroupQueue) -> anyhow::Result<()> {
        task_group_queue::Entity::update(task_group_queue::Model::update_set(row))
            .exec(self.db.get_connection())
            .await?;
        Ok(())
    }

    async fn get_by_task_instance(
        &self,
        task_instance_id: Uuid,
    ) -> anyhow::Result<Option<TaskGroupQueue>> {
        task_group_queue::Entity::find()
            .filter(task_group_queue::Column::TaskInstanceId.eq(task_instance_id))
            .one(self.db.get_connection())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn get_waiting_page(
        &self,
        last_seen_id: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<TaskGroupQueue>> {
        task_group_queue::Entity::find()
            .filter(task_group_queue::Column::Id.gt(last_seen_id))
            .filter(task_group_queue::Column::InQueue.eq(true))
            .filter(task_group_queue::Column::Status.eq(TaskGroupQueueStatus::WaitQueue as i32))
            .filter(task_group_queue::Column::ForceStart.eq(false))
            .order_by_asc(task_group_queue::Column::Id)
            .limit(limit)
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn get_force_start_page(
        &self,
        last_seen_id: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<TaskGroupQueue>> {
        task_group_queue::Entity::find()
            .filter(task_group_queue::Column::Id.gt(last_seen_id))
            .filter(task_group_queue::Column::InQueue.eq(true))
            .filter(task_group_queue::Column::ForceStart.eq(true))
            .order_by_asc(task_group_queue::Column::Id)
            .limit(limit)
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = task_group_queue::Entity::delete_by_id(id)
            .exec(self.db.get_connection())
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn delete_by_workflow_instance(
        &self,
        workflow_instance_id: Uuid,
    ) -> anyhow::Result<u64> {
        let result = task_group_queue::Entity::delete_many()
            .filter(task_group_queue::Column::WorkflowInstanceId.eq(workflow_instance_id))
            .exec(self.db.get_connection())
            .await?;
        Ok(result.rows_affected)
    }
}
