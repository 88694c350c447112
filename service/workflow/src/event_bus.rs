use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use domain_workflow::model::{
    entity::{
        TaskInstance, TaskInstanceStatus, WorkflowDefinition, WorkflowInstance,
        WorkflowInstanceStatus,
    },
    vo::{
        msg::{TaskStateChange, WorkflowEvent},
        TaskExecutionContext,
    },
};
use uuid::Uuid;

use crate::context::EngineContext;
use crate::execution_graph::WorkflowExecutionGraph;
use crate::factory::{AttemptSeed, TaskTransition};
use crate::runnable::TaskExecutionRunnable;

/// Handle to one workflow instance's event bus. Present in the engine
/// registry exactly while the instance is active; sending after finalize
/// fails and the caller treats the instance as gone.
pub struct WorkflowExecutionRunnable {
    pub workflow_instance_id: Uuid,
    event_tx: flume::Sender<WorkflowEvent>,
}

impl WorkflowExecutionRunnable {
    pub fn send(&self, event: WorkflowEvent) -> anyhow::Result<()> {
        self.event_tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("event bus of workflow instance is closed"))
    }
}

pub(crate) type RunnableRegistry = DashMap<Uuid, Arc<WorkflowExecutionRunnable>>;

pub(crate) fn spawn_consumer(
    ctx: Arc<EngineContext>,
    registry: Arc<RunnableRegistry>,
    definition: Arc<WorkflowDefinition>,
    instance: WorkflowInstance,
    graph: WorkflowExecutionGraph,
    seeds: HashMap<String, AttemptSeed>,
) -> Arc<WorkflowExecutionRunnable> {
    let (event_tx, event_rx) = flume::unbounded();
    let runnable = Arc::new(WorkflowExecutionRunnable {
        workflow_instance_id: instance.id,
        event_tx: event_tx.clone(),
    });
    registry.insert(instance.id, runnable.clone());

    let consumer = WorkflowEventConsumer {
        ctx,
        registry,
        definition,
        instance,
        graph,
        seeds,
        event_rx,
        event_tx,
        failed_nodes: HashSet::new(),
        done: false,
    };
    tokio::spawn(consumer.run());
    runnable
}

/// Single consumer of one instance's inbox: events are processed strictly
/// in arrival order, which gives per-instance sequential semantics while
/// many instances run concurrently on the shared pool.
struct WorkflowEventConsumer {
    ctx: Arc<EngineContext>,
    registry: Arc<RunnableRegistry>,
    definition: Arc<WorkflowDefinition>,
    instance: WorkflowInstance,
    graph: WorkflowExecutionGraph,
    seeds: HashMap<String, AttemptSeed>,
    event_rx: flume::Receiver<WorkflowEvent>,
    /// Kept for internally-raised events (retry timers).
    event_tx: flume::Sender<WorkflowEvent>,
    failed_nodes: HashSet<String>,
    done: bool,
}

impl WorkflowEventConsumer {
    async fn run(mut self) {
        let workflow_instance_id = self.instance.id;
        tracing::debug!(%workflow_instance_id, "workflow event consumer started");
        loop {
            let event = match self.event_rx.recv_async().await {
                Ok(event) => event,
                Err(_) => break,
            };
            if let Err(e) = self.handle(event).await {
                tracing::error!(%workflow_instance_id, error = %e, "workflow event handling failed");
            }
            if self.done {
                break;
            }
        }
        tracing::debug!(%workflow_instance_id, "workflow event consumer stopped");
    }

    async fn handle(&mut self, event: WorkflowEvent) -> anyhow::Result<()> {
        match event {
            WorkflowEvent::Trigger => self.on_trigger().await,
            WorkflowEvent::Pause => self.on_pause().await,
            WorkflowEvent::Kill => self.on_kill().await,
            WorkflowEvent::Finalize => {
                self.finalize_now().await;
                Ok(())
            }
            WorkflowEvent::SlotAcquired { task_instance_id } => {
                self.on_slot_acquired(task_instance_id).await
            }
            WorkflowEvent::TimeoutCheck => self.on_timeout_check().await,
            WorkflowEvent::RetryTask { task_code } => self.on_retry_task(task_code).await,
            WorkflowEvent::TaskStateChange { task_code, change } => {
                self.on_task_state_change(task_code, change).await
            }
        }
    }

    async fn on_trigger(&mut self) -> anyhow::Result<()> {
        if self.instance.status.is_finished() {
            return Ok(());
        }
        self.instance.status = WorkflowInstanceStatus::Running;
        if self.instance.started_at.is_none() {
            self.instance.started_at = Some(Utc::now());
        }
        self.ctx.workflow_instance_repo.update(&self.instance).await?;
        self.submit_ready().await?;
        self.maybe_finish().await
    }

    async fn on_pause(&mut self) -> anyhow::Result<()> {
        if self.instance.status.is_finished() {
            return Ok(());
        }
        self.instance.status = WorkflowInstanceStatus::Pausing;
        self.ctx.workflow_instance_repo.update(&self.instance).await?;

        let runnables: Vec<_> = self.graph.runnables().cloned().collect();
        for runnable in runnables {
            match runnable.status() {
                // Not dispatched yet: pause locally, the remote never saw it.
                Some(TaskInstanceStatus::SubmittedSuccess) => {
                    self.settle_undispatched(&runnable, TaskInstanceStatus::Paused).await?;
                }
                Some(TaskInstanceStatus::Dispatched | TaskInstanceStatus::RunningExecution) => {
                    self.ctx.pause_operator.operate(&runnable).await?;
                }
                _ => {}
            }
        }
        self.maybe_finish().await
    }

    async fn on_kill(&mut self) -> anyhow::Result<()> {
        if self.instance.status.is_finished() {
            return Ok(());
        }
        self.instance.status = WorkflowInstanceStatus::Killing;
        self.ctx.workflow_instance_repo.update(&self.instance).await?;

        let runnables: Vec<_> = self.graph.runnables().cloned().collect();
        for runnable in runnables {
            if matches!(runnable.status(), Some(s) if !s.is_finished()) {
                self.ctx.kill_operator.operate(&runnable).await?;
                if let Some(instance) = runnable.instance() {
                    if instance.task_group_id.is_some() {
                        self.ctx.slot_service.release(&instance).await?;
                    }
                }
            }
        }
        self.maybe_finish().await
    }

    async fn on_slot_acquired(&mut self, task_instance_id: Uuid) -> anyhow::Result<()> {
        let Some(runnable) = self.graph.runnable_by_instance_id(task_instance_id).cloned() else {
            tracing::warn!(%task_instance_id, "slot granted to unknown task instance");
            return Ok(());
        };
        if runnable.awaits_dispatch() && self.instance.status.accepts_new_attempts() {
            self.ctx.dispatch_operator.operate(runnable)?;
        }
        Ok(())
    }

    async fn on_timeout_check(&mut self) -> anyhow::Result<()> {
        let runnables: Vec<_> = self.graph.runnables().cloned().collect();
        for runnable in runnables {
            let Some(instance) = runnable.instance() else { continue };
            if !matches!(
                instance.status,
                TaskInstanceStatus::Dispatched | TaskInstanceStatus::RunningExecution
            ) {
                continue;
            }
            let Some(timeout) = runnable.definition().timeout_seconds else { continue };
            let since = instance.started_at.or(instance.submitted_at);
            let Some(since) = since else { continue };
            let elapsed = (Utc::now() - since).num_seconds();
            if elapsed < timeout as i64 {
                continue;
            }
            tracing::warn!(
                task_code = runnable.task_code,
                elapsed,
                timeout,
                "task attempt exceeded its timeout"
            );
            if self.ctx.timeout_operator.operate(&runnable).await? {
                self.after_attempt_failed(&runnable).await?;
            }
        }
        Ok(())
    }

    async fn on_retry_task(&mut self, task_code: i64) -> anyhow::Result<()> {
        if !self.instance.status.accepts_new_attempts() {
            return Ok(());
        }
        let Some(runnable) = self.graph.runnable_by_code(task_code).cloned() else {
            return Ok(());
        };
        let Some(prior) = runnable.instance() else {
            return Ok(());
        };
        let instance = self.ctx.factory.materialize(TaskTransition::Retry { prior }).await?;
        self.bind_and_submit(&runnable, instance).await
    }

    async fn on_task_state_change(
        &mut self,
        task_code: i64,
        change: TaskStateChange,
    ) -> anyhow::Result<()> {
        let Some(runnable) = self.graph.runnable_by_code(task_code).cloned() else {
            anyhow::bail!("state change for unknown task code {task_code}");
        };
        let Some(mut instance) = runnable.instance() else {
            anyhow::bail!("state change for task code {task_code} before first attempt");
        };

        match change {
            TaskStateChange::Dispatched { host } => {
                instance.host = Some(host);
                instance.status = TaskInstanceStatus::Dispatched;
                self.persist_attempt(&runnable, instance).await
            }
            TaskStateChange::Running => {
                instance.status = TaskInstanceStatus::RunningExecution;
                if instance.started_at.is_none() {
                    instance.started_at = Some(Utc::now());
                }
                self.persist_attempt(&runnable, instance).await
            }
            TaskStateChange::InfoUpdated {
                execute_path,
                log_path,
            } => {
                if execute_path.is_some() {
                    instance.execute_path = execute_path;
                }
                if log_path.is_some() {
                    instance.log_path = log_path;
                }
                self.persist_attempt(&runnable, instance).await
            }
            TaskStateChange::Succeeded { variable_pool } => {
                instance.status = TaskInstanceStatus::Success;
                instance.ended_at = Some(Utc::now());
                instance.variable_pool.extend(variable_pool.clone());
                self.persist_attempt(&runnable, instance.clone()).await?;
                if instance.task_group_id.is_some() {
                    self.ctx.slot_service.release(&instance).await?;
                }
                if !variable_pool.is_empty() {
                    self.instance.merge_variable_pool(&variable_pool);
                    self.ctx.workflow_instance_repo.update(&self.instance).await?;
                }
                self.graph.mark_succeeded(runnable.node_name());
                if self.instance.status.accepts_new_attempts() {
                    self.submit_ready().await?;
                }
                self.maybe_finish().await
            }
            TaskStateChange::Failed { message } => {
                if let Some(message) = &message {
                    tracing::warn!(task_code, message = %message, "task attempt failed");
                }
                instance.status = TaskInstanceStatus::Failure;
                instance.ended_at = Some(Utc::now());
                self.persist_attempt(&runnable, instance).await?;
                self.after_attempt_failed(&runnable).await
            }
            TaskStateChange::TimedOut => {
                instance.status = TaskInstanceStatus::Failure;
                instance.ended_at = Some(Utc::now());
                self.persist_attempt(&runnable, instance).await?;
                self.after_attempt_failed(&runnable).await
            }
            TaskStateChange::Killed => {
                if !instance.status.is_finished() {
                    instance.status = TaskInstanceStatus::Kill;
                    instance.ended_at = Some(Utc::now());
                    self.persist_attempt(&runnable, instance.clone()).await?;
                }
                if instance.task_group_id.is_some() {
                    self.ctx.slot_service.release(&instance).await?;
                }
                self.maybe_finish().await
            }
            TaskStateChange::Paused => {
                instance.status = TaskInstanceStatus::Paused;
                self.persist_attempt(&runnable, instance.clone()).await?;
                if instance.task_group_id.is_some() {
                    self.ctx.slot_service.release(&instance).await?;
                }
                self.maybe_finish().await
            }
        }
    }

    /// Retry when budget and workflow state allow it, otherwise record the
    /// node as failed and see whether the run can still finish.
    async fn after_attempt_failed(
        &mut self,
        runnable: &Arc<TaskExecutionRunnable>,
    ) -> anyhow::Result<()> {
        if let Some(instance) = runnable.instance() {
            if instance.task_group_id.is_some() {
                self.ctx.slot_service.release(&instance).await?;
            }
        }
        if self.instance.status.accepts_new_attempts() && runnable.needs_retry() {
            let task_code = runnable.task_code;
            let interval = runnable.definition().retry_interval;
            if interval == 0 {
                return self.on_retry_task(task_code).await;
            }
            let event_tx = self.event_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(interval)).await;
                let _ = event_tx.send(WorkflowEvent::RetryTask { task_code });
            });
            return Ok(());
        }
        self.failed_nodes.insert(runnable.node_name().to_owned());
        self.maybe_finish().await
    }

    /// Materialize attempts for every node whose predecessors settled.
    /// Skipped nodes settle without an attempt, possibly cascading.
    async fn submit_ready(&mut self) -> anyhow::Result<()> {
        if !self.instance.status.accepts_new_attempts() {
            return Ok(());
        }
        loop {
            let skips = self.graph.releasable_skips()?;
            if skips.is_empty() {
                break;
            }
            for name in skips {
                self.graph.mark_succeeded(&name);
            }
        }
        for name in self.graph.ready_nodes()? {
            let Some(runnable) = self.graph.runnable_by_name(&name).cloned() else {
                anyhow::bail!("dag node {name} has no runnable stored");
            };
            if runnable.instance().is_some() {
                // Already materialized earlier (in flight or settled).
                continue;
            }
            let seed = self.seeds.remove(&name).unwrap_or(AttemptSeed::Fresh);
            let transition = match seed {
                AttemptSeed::Fresh => TaskTransition::FirstRun {
                    definition: runnable.definition(),
                    workflow_instance: &self.instance,
                },
                AttemptSeed::FailedRecover(prior) => TaskTransition::FailedRecover { prior },
                AttemptSeed::PauseRecover(prior) => TaskTransition::PauseRecover { prior },
                AttemptSeed::Failover(prior) => TaskTransition::Failover { prior },
            };
            let instance = self.ctx.factory.materialize(transition).await?;
            self.bind_and_submit(&runnable, instance).await?;
        }
        Ok(())
    }

    /// Rebuild the execution-context snapshot around a fresh attempt and
    /// route it through the group limiter or straight to dispatch.
    async fn bind_and_submit(
        &mut self,
        runnable: &Arc<TaskExecutionRunnable>,
        instance: TaskInstance,
    ) -> anyhow::Result<()> {
        let environment = match instance.environment_code {
            Some(code) => self.ctx.environment_repo.get_by_code(code).await?,
            None => None,
        };
        let context = TaskExecutionContext {
            workflow_definition: (*self.definition).clone(),
            workflow_instance: self.instance.clone(),
            task_definition: runnable.definition().clone(),
            task_instance: instance.clone(),
            environment,
        };
        runnable.bind(instance.clone(), context, self.instance.priority);

        if instance.task_group_id.is_some() {
            let mut row = self.ctx.slot_service.enqueue(&instance).await?;
            if self.ctx.slot_service.try_acquire(&mut row).await? {
                self.ctx.dispatch_operator.operate(runnable.clone())?;
            }
            // Otherwise the wait-queue poller promotes it later.
        } else {
            self.ctx.dispatch_operator.operate(runnable.clone())?;
        }
        Ok(())
    }

    async fn persist_attempt(
        &mut self,
        runnable: &Arc<TaskExecutionRunnable>,
        instance: TaskInstance,
    ) -> anyhow::Result<()> {
        self.ctx.task_instance_repo.update(&instance).await?;
        runnable.update_instance(instance);
        Ok(())
    }

    fn has_attempts_in_flight(&self) -> bool {
        self.graph.runnables().any(|r| {
            matches!(
                r.status(),
                Some(
                    TaskInstanceStatus::SubmittedSuccess
                        | TaskInstanceStatus::Dispatched
                        | TaskInstanceStatus::RunningExecution
                )
            )
        })
    }

    /// Settle the run when nothing is in flight any more: completed when
    /// the whole graph succeeded, else paused/killed/failed according to
    /// what stopped it.
    async fn maybe_finish(&mut self) -> anyhow::Result<()> {
        if self.has_attempts_in_flight() {
            return Ok(());
        }
        let settled = match self.instance.status {
            _ if self.graph.all_done() => {
                self.instance.status = WorkflowInstanceStatus::Completed;
                self.instance.ended_at = Some(Utc::now());
                true
            }
            WorkflowInstanceStatus::Pausing => {
                self.instance.status = WorkflowInstanceStatus::Paused;
                true
            }
            WorkflowInstanceStatus::Killing => {
                self.instance.status = WorkflowInstanceStatus::Killed;
                self.instance.ended_at = Some(Utc::now());
                true
            }
            WorkflowInstanceStatus::Running if !self.failed_nodes.is_empty() => {
                self.instance.status = WorkflowInstanceStatus::Failed;
                self.instance.ended_at = Some(Utc::now());
                true
            }
            _ => false,
        };
        if settled {
            self.ctx.workflow_instance_repo.update(&self.instance).await?;
            tracing::info!(
                workflow_instance_id = %self.instance.id,
                status = ?self.instance.status,
                "workflow instance settled"
            );
            self.finalize_now().await;
        }
        Ok(())
    }

    /// Idempotent teardown: drop out of the registry, clean owned group
    /// queue rows and stop the consumer.
    async fn finalize_now(&mut self) {
        self.registry.remove(&self.instance.id);
        if let Err(e) = self
            .ctx
            .task_group_queue_repo
            .delete_by_workflow_instance(self.instance.id)
            .await
        {
            tracing::error!(
                workflow_instance_id = %self.instance.id,
                error = %e,
                "task group queue cleanup failed"
            );
        }
        self.done = true;
    }

    /// Flip a never-dispatched attempt's row directly; there is no remote
    /// to signal.
    async fn settle_undispatched(
        &mut self,
        runnable: &Arc<TaskExecutionRunnable>,
        status: TaskInstanceStatus,
    ) -> anyhow::Result<()> {
        let Some(mut instance) = runnable.instance() else {
            return Ok(());
        };
        instance.status = status;
        self.persist_attempt(runnable, instance.clone()).await?;
        if instance.task_group_id.is_some() {
            self.ctx.slot_service.release(&instance).await?;
        }
        Ok(())
    }
}
