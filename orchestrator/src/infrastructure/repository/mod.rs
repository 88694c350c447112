mod command;
mod environment;
mod task_group;
mod task_instance;
mod workflow_definition;
mod workflow_instance;

use std::sync::Arc;

use typed_builder::TypedBuilder;

use super::database::Database;

/// One sea-orm-backed repository implementing every storage contract the
/// engine consumes.
#[derive(TypedBuilder, Clone)]
pub struct OrmRepo {
    pub db: Arc<Database>,
}
