use std::sync::{Arc, Mutex};

use domain_workflow::model::{
    entity::{TaskDefinition, TaskInstance, TaskInstanceStatus, TaskType},
    vo::{DispatchPriority, Priority, TaskExecutionContext},
};
use uuid::Uuid;

/// In-memory handle bound 1:1 to the currently-active attempt of one task
/// code in one running workflow instance. The owning event consumer is the
/// only writer; the dispatch loop and the waiting queue read immutable
/// snapshots.
pub struct TaskExecutionRunnable {
    pub task_code: i64,
    pub workflow_instance_id: Uuid,
    definition: TaskDefinition,
    state: Mutex<BoundState>,
}

#[derive(Default)]
struct BoundState {
    instance: Option<TaskInstance>,
    context: Option<Arc<TaskExecutionContext>>,
    priority: Option<DispatchPriority>,
}

impl TaskExecutionRunnable {
    pub fn new(workflow_instance_id: Uuid, definition: TaskDefinition) -> Self {
        Self {
            task_code: definition.code,
            workflow_instance_id,
            definition,
            state: Mutex::new(BoundState::default()),
        }
    }

    pub fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    pub fn node_name(&self) -> &str {
        &self.definition.name
    }

    pub fn task_type(&self) -> TaskType {
        self.definition.task_type
    }

    /// Replace the held attempt and its execution-context snapshot. Called
    /// on first run and again on every retry/failover/recover transition.
    pub fn bind(
        &self,
        instance: TaskInstance,
        context: TaskExecutionContext,
        workflow_priority: Priority,
    ) {
        let priority = DispatchPriority {
            workflow_priority,
            task_priority: instance.priority,
            group_priority: instance.task_group_priority,
            submitted_at: instance.submitted_at.unwrap_or_default(),
        };
        let mut state = self.state.lock().expect("runnable state poisoned");
        state.instance = Some(instance);
        state.context = Some(Arc::new(context));
        state.priority = Some(priority);
    }

    /// Fold a mutated attempt back in without rebuilding the context
    /// snapshot (status/host/path bookkeeping).
    pub fn update_instance(&self, instance: TaskInstance) {
        let mut state = self.state.lock().expect("runnable state poisoned");
        if let Some(ctx) = state.context.as_ref() {
            let mut ctx = TaskExecutionContext::clone(ctx);
            ctx.task_instance = instance.clone();
            state.context = Some(Arc::new(ctx));
        }
        state.instance = Some(instance);
    }

    pub fn instance(&self) -> Option<TaskInstance> {
        self.state.lock().expect("runnable state poisoned").instance.clone()
    }

    pub fn context(&self) -> Option<Arc<TaskExecutionContext>> {
        self.state.lock().expect("runnable state poisoned").context.clone()
    }

    pub fn priority(&self) -> Option<DispatchPriority> {
        self.state.lock().expect("runnable state poisoned").priority
    }

    pub fn status(&self) -> Option<TaskInstanceStatus> {
        self.state
            .lock()
            .expect("runnable state poisoned")
            .instance
            .as_ref()
            .map(|i| i.status)
    }

    /// Whether the attempt is still waiting for the dispatch loop. Stale
    /// queue entries (killed or already-sent attempts) answer false and
    /// get dropped instead of dispatched.
    pub fn awaits_dispatch(&self) -> bool {
        matches!(self.status(), Some(TaskInstanceStatus::SubmittedSuccess))
    }

    /// The attempt chain still has retry budget. The event consumer still
    /// decides whether to use it; a pausing or killing workflow does not.
    pub fn needs_retry(&self) -> bool {
        self.instance().map(|i| i.needs_retry()).unwrap_or(false)
    }
}
