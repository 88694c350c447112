use domain_workflow::model::entity::Environment;
use domain_workflow::repository::EnvironmentRepo;
use sea_orm::EntityTrait;

use super::OrmRepo;
use crate::infrastructure::database::model::environment;

#[async_trait::async_trait]
impl EnvironmentRepo for OrmRepo {
    async fn get_by_code(&self, code: i64) -> anyhow::Result<Option<Environment>> {
        environment::Entity::find_by_id(code)
            .one(self.db.get_connection())
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}
