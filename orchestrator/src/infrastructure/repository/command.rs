use domain_workflow::model::entity::Command;
use domain_workflow::repository::CommandRepo;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::OrmRepo;
use crate::infrastructure::database::model::command;

#[async_trait::async_trait]
impl CommandRepo for OrmRepo {
    async fn insert(&self, entity: &Command) -> anyhow::Result<()> {
        command::Entity::insert(command::ActiveModel::try_from(entity)?)
            .exec(self.db.get_connection())
            .await?;
        Ok(())
    }

    async fn fetch_page(&self, last_seen_id: i64, limit: u64) -> anyhow::Result<Vec<Command>> {
        command::Entity::find()
            .filter(command::Column::Id.gt(last_seen_id))
            .order_by_asc(command::Column::Id)
            .limit(limit)
            .all(self.db.get_connection())
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = command::Entity::delete_by_id(id).exec(self.db.get_connection()).await?;
        Ok(result.rows_affected == 1)
    }
}
