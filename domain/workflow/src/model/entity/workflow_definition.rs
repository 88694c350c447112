use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Immutable versioned workflow template. The orchestrator only reads it;
/// authoring lives in the definition backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkflowDefinition {
    pub code: i64,
    pub version: i32,
    pub name: String,
    /// Seed values for the instance variable pool.
    pub global_params: HashMap<String, String>,
}
