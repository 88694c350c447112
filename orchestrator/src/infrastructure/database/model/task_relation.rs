use domain_workflow::model::vo::DagEdge;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_relation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    pub from_node_name: String,
    pub to_node_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DagEdge {
    fn from(model: Model) -> Self {
        Self {
            from_node_name: model.from_node_name,
            to_node_name: model.to_node_name,
        }
    }
}
