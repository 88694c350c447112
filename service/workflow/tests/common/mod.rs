//! Shared in-memory storage fakes for engine tests. Conditional updates
//! run under one lock, mirroring the atomicity the real repositories get
//! from conditional UPDATE statements.
#![allow(dead_code)]

pub mod harness;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use domain_workflow::model::entity::{
    Environment, Flag, TaskGroup, TaskGroupQueue, TaskInstance, WorkflowInstance,
};
use domain_workflow::repository::{
    EnvironmentRepo, TaskGroupQueueRepo, TaskGroupRepo, TaskInstanceRepo, WorkflowInstanceRepo,
};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStore {
    pub task_instances: Mutex<HashMap<Uuid, TaskInstance>>,
    pub workflow_instances: Mutex<HashMap<Uuid, WorkflowInstance>>,
    pub environments: Mutex<HashMap<i64, Environment>>,
    pub task_groups: Mutex<HashMap<Uuid, TaskGroup>>,
    pub group_queue: Mutex<Vec<TaskGroupQueue>>,
    next_queue_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_rows(&self, task_code: i64) -> Vec<TaskInstance> {
        self.task_instances
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.task_code == task_code && t.flag == Flag::Active)
            .cloned()
            .collect()
    }

    pub fn rows(&self, task_code: i64) -> Vec<TaskInstance> {
        self.task_instances
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.task_code == task_code)
            .cloned()
            .collect()
    }

    pub fn group_use_size(&self, id: Uuid) -> i32 {
        self.task_groups.lock().unwrap().get(&id).unwrap().use_size
    }
}

#[async_trait::async_trait]
impl TaskInstanceRepo for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskInstance> {
        self.task_instances
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no task instance {id}"))
    }

    async fn insert(&self, instance: &TaskInstance) -> anyhow::Result<()> {
        self.task_instances.lock().unwrap().insert(instance.id, instance.clone());
        Ok(())
    }

    async fn update(&self, instance: &TaskInstance) -> anyhow::Result<()> {
        self.task_instances.lock().unwrap().insert(instance.id, instance.clone());
        Ok(())
    }

    async fn insert_and_update(
        &self,
        new: &TaskInstance,
        prior: &TaskInstance,
    ) -> anyhow::Result<()> {
        let mut rows = self.task_instances.lock().unwrap();
        rows.insert(new.id, new.clone());
        rows.insert(prior.id, prior.clone());
        Ok(())
    }

    async fn get_active_by_workflow_instance(
        &self,
        workflow_instance_id: Uuid,
    ) -> anyhow::Result<Vec<TaskInstance>> {
        Ok(self
            .task_instances
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.workflow_instance_id == workflow_instance_id && t.flag == Flag::Active)
            .cloned()
            .collect())
    }

    async fn get_active_by_host(&self, host: &str) -> anyhow::Result<Vec<TaskInstance>> {
        Ok(self
            .task_instances
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.host.as_deref() == Some(host) && t.flag == Flag::Active)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl WorkflowInstanceRepo for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<WorkflowInstance> {
        self.workflow_instances
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no workflow instance {id}"))
    }

    async fn insert(&self, instance: &WorkflowInstance) -> anyhow::Result<()> {
        self.workflow_instances.lock().unwrap().insert(instance.id, instance.clone());
        Ok(())
    }

    async fn update(&self, instance: &WorkflowInstance) -> anyhow::Result<()> {
        self.workflow_instances.lock().unwrap().insert(instance.id, instance.clone());
        Ok(())
    }

    async fn get_unfinished_by_host(&self, host: &str) -> anyhow::Result<Vec<WorkflowInstance>> {
        Ok(self
            .workflow_instances
            .lock()
            .unwrap()
            .values()
            .filter(|w| w.host.as_deref() == Some(host) && !w.status.is_finished())
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl EnvironmentRepo for InMemoryStore {
    async fn get_by_code(&self, code: i64) -> anyhow::Result<Option<Environment>> {
        Ok(self.environments.lock().unwrap().get(&code).cloned())
    }
}

#[async_trait::async_trait]
impl TaskGroupRepo for InMemoryStore {
    async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskGroup> {
        self.task_groups
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no task group {id}"))
    }

    async fn try_acquire_slot(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut groups = self.task_groups.lock().unwrap();
        let group = groups.get_mut(&id).ok_or_else(|| anyhow::anyhow!("no task group {id}"))?;
        if !group.enabled || group.use_size >= group.group_size {
            return Ok(false);
        }
        group.use_size += 1;
        Ok(true)
    }

    async fn try_release_slot(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut groups = self.task_groups.lock().unwrap();
        let group = groups.get_mut(&id).ok_or_else(|| anyhow::anyhow!("no task group {id}"))?;
        if group.use_size <= 0 {
            return Ok(false);
        }
        group.use_size -= 1;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl TaskGroupQueueRepo for InMemoryStore {
    async fn insert(&self, row: &TaskGroupQueue) -> anyhow::Result<TaskGroupQueue> {
        let mut inserted = row.clone();
        inserted.id = self.next_queue_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.group_queue.lock().unwrap().push(inserted.clone());
        Ok(inserted)
    }

    async fn update(&self, row: &TaskGroupQueue) -> anyhow::Result<()> {
        let mut rows = self.group_queue.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|r| r.id == row.id) {
            *existing = row.clone();
        }
        Ok(())
    }

    async fn get_by_task_instance(
        &self,
        task_instance_id: Uuid,
    ) -> anyhow::Result<Option<TaskGroupQueue>> {
        Ok(self
            .group_queue
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.task_instance_id == task_instance_id)
            .cloned())
    }

    async fn get_waiting_page(
        &self,
        last_seen_id: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<TaskGroupQueue>> {
        let mut rows: Vec<_> = self
            .group_queue
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.id > last_seen_id && r.in_queue && !r.force_start)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn get_force_start_page(
        &self,
        last_seen_id: i64,
        limit: u64,
    ) -> anyhow::Result<Vec<TaskGroupQueue>> {
        let mut rows: Vec<_> = self
            .group_queue
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.id > last_seen_id && r.in_queue && r.force_start)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut rows = self.group_queue.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }

    async fn delete_by_workflow_instance(
        &self,
        workflow_instance_id: Uuid,
    ) -> anyhow::Result<u64> {
        let mut rows = self.group_queue.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.workflow_instance_id != workflow_instance_id);
        Ok((before - rows.len()) as u64)
    }
}
