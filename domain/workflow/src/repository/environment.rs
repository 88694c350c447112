use crate::model::entity::Environment;

#[async_trait::async_trait]
pub trait EnvironmentRepo: Send + Sync {
    async fn get_by_code(&self, code: i64) -> anyhow::Result<Option<Environment>>;
}
