use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use domain_workflow::service::{WorkerInfo, WorkerSelector};

/// Configuration-backed worker membership: a static map of worker group to
/// host list, walked round-robin. Live registration belongs to cluster
/// membership and can replace this behind the same trait.
pub struct ConfigWorkerSelector {
    groups: HashMap<String, Vec<String>>,
    cursor: AtomicUsize,
}

impl ConfigWorkerSelector {
    pub fn new(groups: HashMap<String, Vec<String>>) -> Self {
        Self {
            groups,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl WorkerSelector for ConfigWorkerSelector {
    async fn select(&self, worker_group: &str) -> anyhow::Result<Option<WorkerInfo>> {
        let Some(hosts) = self.groups.get(worker_group) else {
            return Ok(None);
        };
        if hosts.is_empty() {
            return Ok(None);
        }
        let n = self.cursor.fetch_add(1, Ordering::Relaxed);
        Ok(Some(WorkerInfo {
            host: hosts[n % hosts.len()].clone(),
            worker_group: worker_group.to_owned(),
        }))
    }
}
