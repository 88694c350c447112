use std::sync::Arc;
use std::time::Duration;

use domain_workflow::model::entity::{TaskGroupQueue, TaskGroupQueueStatus, TaskInstance};
use domain_workflow::model::vo::msg::WorkflowEvent;
use domain_workflow::repository::{TaskGroupQueueRepo, TaskGroupRepo};
use tokio::sync::watch;
use typed_builder::TypedBuilder;

use crate::engine::WorkflowEngine;

/// Distributed semaphore over relational storage, bounding concurrent task
/// instances per named group across every orchestrator and worker process.
/// The conditional updates in the group repo are the only way `use_size`
/// moves, so losing a race here is a normal stay-queued outcome.
#[derive(TypedBuilder)]
pub struct TaskGroupSlotService {
    task_group_repo: Arc<dyn TaskGroupRepo>,
    queue_repo: Arc<dyn TaskGroupQueueRepo>,
}

impl TaskGroupSlotService {
    /// Register a grouped attempt as contending for a slot.
    pub async fn enqueue(&self, task: &TaskInstance) -> anyhow::Result<TaskGroupQueue> {
        let group_id = task
            .task_group_id
            .ok_or_else(|| anyhow::anyhow!("task instance {} has no task group", task.id))?;
        let row = TaskGroupQueue {
            id: 0,
            task_group_id: group_id,
            task_instance_id: task.id,
            workflow_instance_id: task.workflow_instance_id,
            priority: task.task_group_priority,
            status: TaskGroupQueueStatus::WaitQueue,
            in_queue: true,
            force_start: false,
            created_at: None,
            updated_at: None,
        };
        self.queue_repo.insert(&row).await
    }

    /// One acquisition attempt for a queued row. Force-started rows bypass
    /// the counter entirely, which is what makes `group_size` a soft
    /// ceiling once the override is used.
    pub async fn try_acquire(&self, row: &mut TaskGroupQueue) -> anyhow::Result<bool> {
        let acquired =
            row.force_start || self.task_group_repo.try_acquire_slot(row.task_group_id).await?;
        if acquired {
            row.status = TaskGroupQueueStatus::AcquireSuccess;
            row.in_queue = false;
            self.queue_repo.update(row).await?;
        }
        Ok(acquired)
    }

    /// Return the slot held by a finished grouped attempt and drop its
    /// queue row. Force-started rows never counted, so they only drop the
    /// row.
    pub async fn release(&self, task: &TaskInstance) -> anyhow::Result<()> {
        let Some(row) = self.queue_repo.get_by_task_instance(task.id).await? else {
            return Ok(());
        };
        if row.status == TaskGroupQueueStatus::AcquireSuccess && !row.force_start {
            if !self.task_group_repo.try_release_slot(row.task_group_id).await? {
                tracing::warn!(
                    task_group_id = %row.task_group_id,
                    "slot release found use_size already at zero"
                );
            }
        }
        self.queue_repo.delete(row.id).await?;
        Ok(())
    }

    /// Best-effort counter return when a promoted row can no longer be
    /// delivered to its owner.
    pub async fn release_group_slot(&self, group_id: uuid::Uuid) {
        match self.task_group_repo.try_release_slot(group_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(task_group_id = %group_id, "slot release found use_size already at zero")
            }
            Err(e) => tracing::error!(task_group_id = %group_id, error = %e, "slot release failed"),
        }
    }
}

/// Scans queued rows and promotes them as capacity appears. Two scan
/// flavors run as separate loops: the wait-queue scan contends through the
/// semaphore, the force-start scan promotes unconditionally.
#[derive(TypedBuilder)]
pub struct TaskGroupQueuePoller {
    slot_service: Arc<TaskGroupSlotService>,
    queue_repo: Arc<dyn TaskGroupQueueRepo>,
    engine: Arc<WorkflowEngine>,
    #[builder(default = Duration::from_secs(5))]
    poll_interval: Duration,
    #[builder(default = 100)]
    page_size: u64,
}

impl TaskGroupQueuePoller {
    pub async fn run_wait_queue(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("task group wait-queue poller started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
            if let Err(e) = self.scan_wait_queue().await {
                tracing::error!(error = %e, "wait-queue scan failed");
            }
        }
        tracing::info!("task group wait-queue poller stopped");
    }

    pub async fn run_force_start(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("task group force-start poller started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
            if let Err(e) = self.scan_force_start().await {
                tracing::error!(error = %e, "force-start scan failed");
            }
        }
        tracing::info!("task group force-start poller stopped");
    }

    /// Keyset walk over `in_queue` rows, each page re-ranked by group
    /// priority before attempting acquisition.
    async fn scan_wait_queue(&self) -> anyhow::Result<()> {
        let mut last_seen = 0;
        loop {
            let mut page = self.queue_repo.get_waiting_page(last_seen, self.page_size).await?;
            let Some(tail) = page.last() else { break };
            last_seen = tail.id;
            page.sort_by(|a, b| b.priority.cmp(&a.priority));
            for mut row in page {
                self.promote(&mut row, false).await?;
            }
        }
        Ok(())
    }

    async fn scan_force_start(&self) -> anyhow::Result<()> {
        let mut last_seen = 0;
        loop {
            let page = self.queue_repo.get_force_start_page(last_seen, self.page_size).await?;
            let Some(tail) = page.last() else { break };
            last_seen = tail.id;
            for mut row in page {
                self.promote(&mut row, true).await?;
            }
        }
        Ok(())
    }

    async fn promote(&self, row: &mut TaskGroupQueue, force: bool) -> anyhow::Result<()> {
        if !self.engine.contains(row.workflow_instance_id) {
            // The queue table is cluster-wide; rows of runs hosted by
            // another orchestrator are that process's business.
            return Ok(());
        }
        if force {
            row.force_start = true;
        }
        if self.slot_service.try_acquire(row).await? {
            let event = WorkflowEvent::SlotAcquired {
                task_instance_id: row.task_instance_id,
            };
            if let Err(e) = self.engine.send_event(row.workflow_instance_id, event) {
                tracing::warn!(
                    workflow_instance_id = %row.workflow_instance_id,
                    error = %e,
                    "owner vanished after slot acquisition, releasing"
                );
                if !row.force_start {
                    self.slot_service.release_group_slot(row.task_group_id).await;
                }
                self.queue_repo.delete(row.id).await?;
            }
        }
        Ok(())
    }
}
