use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use domain_workflow::{
    exception::{WorkflowException, WorkflowResult},
    model::{
        entity::{WorkflowDefinition, WorkflowInstance},
        vo::msg::{TaskExecutionEventMsg, WorkflowEvent},
    },
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::context::EngineContext;
use crate::event_bus::{spawn_consumer, RunnableRegistry, WorkflowExecutionRunnable};
use crate::execution_graph::WorkflowExecutionGraph;
use crate::factory::AttemptSeed;

/// Process-wide router: looks workflow runnables up by instance id and
/// enqueues the matching event. Registration and finalization are the only
/// mutation points of the registry, so a runnable is present exactly while
/// its instance is active.
pub struct WorkflowEngine {
    ctx: Arc<EngineContext>,
    registry: Arc<RunnableRegistry>,
}

impl WorkflowEngine {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            ctx,
            registry: Arc::new(DashMap::new()),
        }
    }

    /// Bring one workflow instance under this engine: build its bus, spawn
    /// its consumer and hand back the registered runnable.
    pub fn spawn_workflow(
        &self,
        definition: Arc<WorkflowDefinition>,
        instance: WorkflowInstance,
        graph: WorkflowExecutionGraph,
        seeds: HashMap<String, AttemptSeed>,
    ) -> Arc<WorkflowExecutionRunnable> {
        tracing::info!(
            workflow_instance_id = %instance.id,
            workflow = %definition.name,
            "registering workflow instance"
        );
        spawn_consumer(
            self.ctx.clone(),
            self.registry.clone(),
            definition,
            instance,
            graph,
            seeds,
        )
    }

    pub fn contains(&self, workflow_instance_id: Uuid) -> bool {
        self.registry.contains_key(&workflow_instance_id)
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    pub fn send_event(&self, workflow_instance_id: Uuid, event: WorkflowEvent) -> WorkflowResult<()> {
        let runnable = self.registry.get(&workflow_instance_id).ok_or(
            WorkflowException::WorkflowInstanceNotFound {
                id: workflow_instance_id,
            },
        )?;
        runnable.send(event).map_err(WorkflowException::from)
    }

    pub fn trigger_workflow(&self, workflow_instance_id: Uuid) -> WorkflowResult<()> {
        self.send_event(workflow_instance_id, WorkflowEvent::Trigger)
    }

    pub fn pause_workflow(&self, workflow_instance_id: Uuid) -> WorkflowResult<()> {
        self.send_event(workflow_instance_id, WorkflowEvent::Pause)
    }

    pub fn kill_workflow(&self, workflow_instance_id: Uuid) -> WorkflowResult<()> {
        self.send_event(workflow_instance_id, WorkflowEvent::Kill)
    }

    /// Remove the instance from the registry and let its consumer tear
    /// down. The sole removal path; calling it for an absent instance is
    /// not an error.
    pub fn finalize_workflow(&self, workflow_instance_id: Uuid) -> WorkflowResult<()> {
        if let Some((_, runnable)) = self.registry.remove(&workflow_instance_id) {
            if runnable.send(WorkflowEvent::Finalize).is_err() {
                // Consumer already gone; registry removal was the point.
                tracing::debug!(%workflow_instance_id, "finalize raced consumer shutdown");
            }
        }
        Ok(())
    }

    /// Entry point for worker execution-event callbacks.
    pub fn on_task_event(&self, msg: TaskExecutionEventMsg) -> WorkflowResult<()> {
        self.send_event(
            msg.workflow_instance_id,
            WorkflowEvent::TaskStateChange {
                task_code: msg.task_code,
                change: msg.change,
            },
        )
    }

    /// Timer-driven probe fanning a timeout check to every active
    /// instance; each consumer applies its own timeout strategies.
    pub async fn run_timeout_monitor(
        &self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!("timeout monitor started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            for entry in self.registry.iter() {
                if entry.value().send(WorkflowEvent::TimeoutCheck).is_err() {
                    tracing::debug!(
                        workflow_instance_id = %entry.key(),
                        "timeout probe raced consumer shutdown"
                    );
                }
            }
        }
        tracing::info!("timeout monitor stopped");
    }
}
