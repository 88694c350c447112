use std::sync::Arc;

use domain_workflow::model::vo::TaskExecutionContext;
use domain_workflow::service::TaskOperateClient;
use reqwest::Client;
use serde::Serialize;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::config::HttpClientConfig;

pub fn new_client(config: &HttpClientConfig) -> anyhow::Result<Arc<Client>> {
    Ok(Arc::new(
        Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?,
    ))
}

#[derive(Serialize)]
struct TaskSignalBody {
    task_instance_id: Uuid,
}

/// JSON client against the worker-side task operator endpoints.
#[derive(TypedBuilder)]
pub struct WorkerTaskOperateClient {
    client: Arc<Client>,
}

impl WorkerTaskOperateClient {
    async fn post<T: Serialize + Sync>(&self, url: String, body: &T) -> anyhow::Result<()> {
        self.client.post(&url).json(body).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskOperateClient for WorkerTaskOperateClient {
    async fn dispatch(&self, host: &str, context: &TaskExecutionContext) -> anyhow::Result<()> {
        self.post(format!("http://{host}/v1/task/dispatch"), context).await
    }

    async fn kill(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()> {
        self.post(
            format!("http://{host}/v1/task/kill"),
            &TaskSignalBody { task_instance_id },
        )
        .await
    }

    async fn pause(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()> {
        self.post(
            format!("http://{host}/v1/task/pause"),
            &TaskSignalBody { task_instance_id },
        )
        .await
    }
}

/// Same surface against a peer orchestrator hosting in-process logic
/// tasks.
#[derive(TypedBuilder)]
pub struct LogicTaskOperateClient {
    client: Arc<Client>,
}

impl LogicTaskOperateClient {
    async fn post<T: Serialize + Sync>(&self, url: String, body: &T) -> anyhow::Result<()> {
        self.client.post(&url).json(body).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskOperateClient for LogicTaskOperateClient {
    async fn dispatch(&self, host: &str, context: &TaskExecutionContext) -> anyhow::Result<()> {
        self.post(format!("http://{host}/v1/logic-task/dispatch"), context).await
    }

    async fn kill(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()> {
        self.post(
            format!("http://{host}/v1/logic-task/kill"),
            &TaskSignalBody { task_instance_id },
        )
        .await
    }

    async fn pause(&self, host: &str, task_instance_id: Uuid) -> anyhow::Result<()> {
        self.post(
            format!("http://{host}/v1/logic-task/pause"),
            &TaskSignalBody { task_instance_id },
        )
        .await
    }
}
