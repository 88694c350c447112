use serde::{Deserialize, Serialize};

/// Execution environment shared by worker groups (shell profile, driver
/// paths and the like). Referenced by code from task definitions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Environment {
    pub code: i64,
    pub name: String,
    pub config: String,
    pub worker_groups: Vec<String>,
}
