use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

use crate::{
    model::{
        entity::{
            Command, Environment, TaskDefinition, TaskGroup, TaskGroupQueue, TaskInstance,
            WorkflowDefinition, WorkflowInstance,
        },
        vo::{DagEdge, TaskExecutionContext},
    },
    repository::{
        CommandRepo, EnvironmentRepo, TaskGroupQueueRepo, TaskGroupRepo, TaskInstanceRepo,
        WorkflowDefinitionRepo, WorkflowInstanceRepo,
    },
    service::{TaskOperateClient, WorkerInfo, WorkerSelector},
};

mock! {
    pub TaskInstanceRepo {}
    #[async_trait]
    impl TaskInstanceRepo for TaskInstanceRepo {
        async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskInstance>;
        async fn insert(&self, instance: &TaskInstance) -> anyhow::Result<()>;
        async fn update(&self, instance: &TaskInstance) -> anyhow::Result<()>;
        async fn insert_and_update(
            &self,
            new: &TaskInstance,
            prior: &TaskInstance,
        ) -> anyhow::Result<()>;
        async fn get_active_by_workflow_instance(
            &self,
            workflow_instance_id: Uuid,
        ) -> anyhow::Result<Vec<TaskInstance>>;
        async fn get_active_by_host(&self, host: &str) -> anyhow::Result<Vec<TaskInstance>>;
    }
}

mock! {
    pub WorkflowInstanceRepo {}
    #[async_trait]
    impl WorkflowInstanceRepo for WorkflowInstanceRepo {
        async fn get_by_id(&self, id: Uuid) -> anyhow::Result<WorkflowInstance>;
        async fn insert(&self, instance: &WorkflowInstance) -> anyhow::Result<()>;
        async fn update(&self, instance: &WorkflowInstance) -> anyhow::Result<()>;
        async fn get_unfinished_by_host(&self, host: &str) -> anyhow::Result<Vec<WorkflowInstance>>;
    }
}

mock! {
    pub TaskGroupRepo {}
    #[async_trait]
    impl TaskGroupRepo for TaskGroupRepo {
        async fn get_by_id(&self, id: Uuid) -> anyhow::Result<TaskGroup>;
        async fn try_acquire_slot(&self, id: Uuid) -> anyhow::Result<bool>;
        async fn try_release_slot(&self, id: Uuid) -> anyhow::Result<bool>;
    }
}

mock! {
    pub TaskGroupQueueRepo {}
    #[async_trait]
    impl TaskGroupQueueRepo for TaskGroupQueueRepo {
        async fn insert(&self, row: &TaskGroupQueue) -> anyhow::Result<TaskGroupQueue>;
        async fn update(&self, row: &TaskGroupQueue) -> anyhow::Result<()>;
        async fn get_by_task_instance(
            &self,
            task_instance_id: Uuid,
        ) -> anyhow::Result<Option<TaskGroupQueue>>;
        async fn get_waiting_page(
            &self,
            last_seen_id: i64,
            limit: u64,
        ) -> anyhow::Result<Vec<TaskGroupQueue>>;
        async fn get_force_start_page(
            &self,
            last_seen_id: i64,
            limit: u64,
        ) -> anyhow::Result<Vec<TaskGroupQueue>>;
        async fn delete(&self, id: i64) -> anyhow::Result<bool>;
        async fn delete_by_workflow_instance(
            &self,
            workflow_instance_id: Uuid,
        ) -> anyhow::Result<u64>;
    }
}

mock! {
    pub CommandRepo {}
    #[async_trait]
    impl CommandRepo for CommandRepo {
        async fn insert(&self, command: &Command) -> anyhow::Result<()>;
        async fn fetch_page(&self, last_seen_id: i64, limit: u64) -> anyhow::Result<Vec<Command>>;
        async fn delete(&self, id: i64) -> anyhow::Result<bool>;
    }
}

mock! {
    pub EnvironmentRepo {}
    #[async_trait]
    impl EnvironmentRepo for EnvironmentRepo {
        async fn get_by_code(&self, code: i64) -> anyhow::Result<Option<Environment>>;
    }
}

mock! {
    pub WorkflowDefinitionRepo {}
    #[async_trait]
    impl WorkflowDefinitionRepo for WorkflowDefinitionRepo {
        async fn get_by_code_version(
            &self,
            code: i64,
            version: i32,
        ) -> anyhow::Result<WorkflowDefinition>;
        async fn get_task_definitions(
            &self,
            code: i64,
            version: i32,
        ) -> anyhow::Result<Vec<TaskDefinition>>;
        async fn get_task_relations(&self, code: i64, version: i32) -> anyhow::Result<Vec<DagEdge>>;
    }
}

mock! {
    pub TaskOperateClient {}
    #[async_trait]
    impl TaskOperateClient for TaskOperateClient {
        async fn dispatch(&self, host: &str, context: &TaskExecutionContext) -> anyhow::Result<()>;
        async fn kill(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()>;
        async fn pause(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()>;
    }
}

mock! {
    pub WorkerSelector {}
    #[async_trait]
    impl WorkerSelector for WorkerSelector {
        async fn select(&self, worker_group: &str) -> anyhow::Result<Option<WorkerInfo>>;
    }
}
