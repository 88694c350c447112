use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use domain_workflow::model::vo::msg::{TaskStateChange, WorkflowEvent};
use domain_workflow::model::vo::DispatchPriority;
use domain_workflow::service::WorkerSelector;
use tokio::sync::{watch, Notify};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::engine::WorkflowEngine;
use crate::operator::TaskOperatorManager;
use crate::runnable::TaskExecutionRunnable;

struct QueuedEntry {
    priority: DispatchPriority,
    /// Arrival tiebreak below the full priority key.
    seq: u64,
    runnable: Arc<TaskExecutionRunnable>,
}

impl PartialEq for QueuedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl Eq for QueuedEntry {}
impl Ord for QueuedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority).then_with(|| self.seq.cmp(&other.seq))
    }
}
impl PartialOrd for QueuedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Process-wide priority queue of ready-to-dispatch runnables across all
/// workflow instances, ranked by the dispatch total order.
#[derive(Default)]
pub struct GlobalTaskDispatchWaitingQueue {
    heap: Mutex<BinaryHeap<Reverse<QueuedEntry>>>,
    seq: AtomicU64,
    notify: Notify,
}

impl GlobalTaskDispatchWaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a runnable using the priority snapshot taken at bind time.
    /// Unbound runnables are refused; they have nothing to dispatch yet.
    pub fn submit(&self, runnable: Arc<TaskExecutionRunnable>) -> anyhow::Result<()> {
        let priority = runnable
            .priority()
            .ok_or_else(|| anyhow::anyhow!("runnable for task {} has no bound attempt", runnable.task_code))?;
        let entry = QueuedEntry {
            priority,
            seq: self.seq.fetch_add(1, AtomicOrdering::Relaxed),
            runnable,
        };
        self.heap.lock().expect("dispatch queue poisoned").push(Reverse(entry));
        self.notify.notify_one();
        Ok(())
    }

    pub fn pop(&self) -> Option<Arc<TaskExecutionRunnable>> {
        self.heap
            .lock()
            .expect("dispatch queue poisoned")
            .pop()
            .map(|Reverse(entry)| entry.runnable)
    }

    /// Await the head entry, parking until something is submitted.
    pub async fn pop_wait(&self) -> Arc<TaskExecutionRunnable> {
        loop {
            if let Some(runnable) = self.pop() {
                return runnable;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.heap.lock().expect("dispatch queue poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The dispatch loop: pops the queue head, picks an eligible worker and
/// sends the attempt out. No eligible worker requeues the same attempt;
/// a rejected RPC is a terminal per-attempt failure fed back to the
/// owning workflow's bus.
#[derive(TypedBuilder)]
pub struct TaskDispatchService {
    queue: Arc<GlobalTaskDispatchWaitingQueue>,
    worker_selector: Arc<dyn WorkerSelector>,
    operator_manager: Arc<TaskOperatorManager>,
    engine: Arc<WorkflowEngine>,
    /// Backoff before retrying when no worker is eligible.
    #[builder(default = Duration::from_millis(500))]
    no_worker_backoff: Duration,
}

impl TaskDispatchService {
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("task dispatch loop started");
        loop {
            let runnable = tokio::select! {
                _ = shutdown.changed() => break,
                runnable = self.queue.pop_wait() => runnable,
            };
            if !runnable.awaits_dispatch() {
                // Killed or superseded while waiting in the queue.
                continue;
            }
            if let Err(e) = self.dispatch_one(runnable).await {
                tracing::error!(error = %e, "dispatch pass failed");
            }
        }
        tracing::info!("task dispatch loop stopped");
    }

    async fn dispatch_one(&self, runnable: Arc<TaskExecutionRunnable>) -> anyhow::Result<()> {
        let context = runnable
            .context()
            .ok_or_else(|| anyhow::anyhow!("queued runnable lost its context"))?;
        let worker_group = &context.task_instance.worker_group;

        let worker = match self.worker_selector.select(worker_group).await {
            Ok(worker) => worker,
            Err(e) => {
                tracing::warn!(worker_group, error = %e, "worker selection failed, requeueing");
                None
            }
        };
        let Some(worker) = worker else {
            // Not a failure: stay on the same attempt until capacity shows up.
            self.queue.submit(runnable)?;
            tokio::time::sleep(self.no_worker_backoff).await;
            return Ok(());
        };

        let client = self.operator_manager.client_for(runnable.task_type());
        match client.dispatch(&worker.host, &context).await {
            Ok(()) => {
                tracing::debug!(
                    task_code = runnable.task_code,
                    host = %worker.host,
                    "task dispatched"
                );
                self.feed_back(
                    runnable.workflow_instance_id,
                    runnable.task_code,
                    TaskStateChange::Dispatched { host: worker.host },
                );
            }
            Err(e) => {
                tracing::warn!(
                    task_code = runnable.task_code,
                    host = %worker.host,
                    error = %e,
                    "dispatch rejected by remote"
                );
                self.feed_back(
                    runnable.workflow_instance_id,
                    runnable.task_code,
                    TaskStateChange::Failed {
                        message: Some(format!("dispatch rejected: {e}")),
                    },
                );
            }
        }
        Ok(())
    }

    fn feed_back(&self, workflow_instance_id: Uuid, task_code: i64, change: TaskStateChange) {
        let event = WorkflowEvent::TaskStateChange { task_code, change };
        if let Err(e) = self.engine.send_event(workflow_instance_id, event) {
            tracing::warn!(%workflow_instance_id, error = %e, "dropping dispatch feedback for vanished workflow");
        }
    }
}
