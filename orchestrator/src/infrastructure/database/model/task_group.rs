use domain_workflow::model::entity::TaskGroup;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub group_size: i32,
    pub use_size: i32,
    pub enabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for TaskGroup {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            group_size: model.group_size,
            use_size: model.use_size,
            enabled: model.enabled,
        }
    }
}
