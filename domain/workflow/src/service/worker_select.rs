use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub host: String,
    pub worker_group: String,
}

/// Picks an eligible worker for a worker group. Capability matching and
/// cluster membership are supplied from outside the engine.
#[async_trait::async_trait]
pub trait WorkerSelector: Send + Sync {
    /// `None` when no eligible worker currently exists; the dispatch loop
    /// requeues the attempt rather than failing it.
    async fn select(&self, worker_group: &str) -> anyhow::Result<Option<WorkerInfo>>;
}
