use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use domain_workflow::{
    model::{
        entity::{
            Command, CommandType, TaskInstance, TaskInstanceStatus, WorkflowInstance,
            WorkflowInstanceStatus,
        },
        vo::{DagNode, WorkflowDag},
    },
    repository::{CommandRepo, TaskInstanceRepo, WorkflowDefinitionRepo, WorkflowInstanceRepo},
};
use tokio::sync::watch;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::engine::WorkflowEngine;
use crate::execution_graph::WorkflowExecutionGraph;
use crate::factory::AttemptSeed;
use crate::runnable::TaskExecutionRunnable;

/// Deterministic sharding of the shared command backlog. Every id belongs
/// to exactly one slot; `id_step` keeps ranges of consecutive ids on the
/// same process for locality instead of strict round-robin.
#[derive(Debug, Clone, Copy)]
pub struct SlotAssignment {
    pub slot: u64,
    pub total_slots: u64,
    pub id_step: u64,
}

impl SlotAssignment {
    pub fn claims(&self, id: i64) -> bool {
        if self.total_slots == 0 || self.id_step == 0 || id < 0 {
            return false;
        }
        (id as u64 / self.id_step) % self.total_slots == self.slot
    }
}

/// Timer-driven loop claiming this process's share of pending commands and
/// expanding each into a registered, triggered workflow instance.
#[derive(TypedBuilder)]
pub struct CommandFetchService {
    command_repo: Arc<dyn CommandRepo>,
    workflow_definition_repo: Arc<dyn WorkflowDefinitionRepo>,
    workflow_instance_repo: Arc<dyn WorkflowInstanceRepo>,
    task_instance_repo: Arc<dyn TaskInstanceRepo>,
    engine: Arc<WorkflowEngine>,
    assignment: SlotAssignment,
    /// Address published as the owning host of claimed runs.
    host: String,
    #[builder(default = Duration::from_secs(1))]
    poll_interval: Duration,
    #[builder(default = 100)]
    page_size: u64,
}

impl CommandFetchService {
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            slot = self.assignment.slot,
            total_slots = self.assignment.total_slots,
            "command fetch loop started"
        );
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
            match self.poll_once().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(count = n, "commands consumed"),
                Err(e) => tracing::error!(error = %e, "command poll failed"),
            }
        }
        tracing::info!("command fetch loop stopped");
    }

    pub async fn poll_once(&self) -> anyhow::Result<usize> {
        let mut processed = 0;
        let mut last_seen = 0;
        loop {
            let page = self.command_repo.fetch_page(last_seen, self.page_size).await?;
            let Some(tail) = page.last() else { break };
            last_seen = tail.id;
            for command in page.into_iter().filter(|c| self.assignment.claims(c.id)) {
                let command_id = command.id;
                match self.handle_command(command).await {
                    Ok(()) => {
                        self.command_repo.delete(command_id).await?;
                        processed += 1;
                    }
                    Err(e) => {
                        // Left in place; the next pass tries again.
                        tracing::error!(command_id, error = %e, "command handling failed");
                    }
                }
            }
        }
        Ok(processed)
    }

    async fn handle_command(&self, command: Command) -> anyhow::Result<()> {
        match command.command_type {
            CommandType::StartWorkflow => self.start_workflow(command).await,
            CommandType::RecoverFromFailedNodes
            | CommandType::RecoverFromPause
            | CommandType::FailoverWorkflow => self.resume_workflow(command).await,
        }
    }

    async fn start_workflow(&self, command: Command) -> anyhow::Result<()> {
        let code = command.workflow_definition_code;
        let version = command.workflow_definition_version;
        let definition =
            Arc::new(self.workflow_definition_repo.get_by_code_version(code, version).await?);

        let mut variable_pool = definition.global_params.clone();
        variable_pool.extend(command.start_params.clone());

        let instance = WorkflowInstance {
            id: Uuid::new_v4(),
            name: format!("{}-{}", definition.name, Utc::now().timestamp_millis()),
            workflow_definition_code: code,
            workflow_definition_version: version,
            status: WorkflowInstanceStatus::Created,
            priority: command.priority,
            executor_id: command.executor_id,
            host: Some(self.host.clone()),
            worker_group: command.worker_group.clone(),
            environment_code: command.environment_code,
            variable_pool,
            submitted_at: Some(Utc::now()),
            started_at: None,
            ended_at: None,
        };
        self.workflow_instance_repo.insert(&instance).await?;

        let graph = self.build_graph(code, version, instance.id, &command.begin_nodes).await?;
        let instance_id = instance.id;
        self.engine.spawn_workflow(definition, instance, graph, HashMap::new());
        self.engine.trigger_workflow(instance_id)?;
        Ok(())
    }

    /// Recovery and failover share one shape: re-own the persisted run,
    /// pre-settle what already succeeded and seed the transition each
    /// unfinished attempt needs.
    async fn resume_workflow(&self, command: Command) -> anyhow::Result<()> {
        let instance_id = command
            .workflow_instance_id
            .ok_or_else(|| anyhow::anyhow!("recovery command {} names no instance", command.id))?;
        if self.engine.contains(instance_id) {
            // Already live here; consuming the command is all that is left.
            return Ok(());
        }

        let mut instance = self.workflow_instance_repo.get_by_id(instance_id).await?;
        let code = instance.workflow_definition_code;
        let version = instance.workflow_definition_version;
        let definition =
            Arc::new(self.workflow_definition_repo.get_by_code_version(code, version).await?);

        instance.host = Some(self.host.clone());
        instance.status = WorkflowInstanceStatus::Created;
        instance.ended_at = None;
        self.workflow_instance_repo.update(&instance).await?;

        let mut graph = self.build_graph(code, version, instance.id, &[]).await?;
        let mut seeds = HashMap::new();
        let actives =
            self.task_instance_repo.get_active_by_workflow_instance(instance_id).await?;
        for row in actives {
            let name = row.name.clone();
            match Self::seed_for(row) {
                None => graph.mark_succeeded(&name),
                Some(seed) => {
                    seeds.insert(name, seed);
                }
            }
        }

        self.engine.spawn_workflow(definition, instance, graph, seeds);
        self.engine.trigger_workflow(instance_id)?;
        Ok(())
    }

    /// Transition owed to one persisted active attempt, `None` when the
    /// node already succeeded and only needs marking.
    fn seed_for(row: TaskInstance) -> Option<AttemptSeed> {
        match row.status {
            TaskInstanceStatus::Success => None,
            TaskInstanceStatus::Paused => Some(AttemptSeed::PauseRecover(row)),
            TaskInstanceStatus::Failure | TaskInstanceStatus::Kill => {
                Some(AttemptSeed::FailedRecover(row))
            }
            TaskInstanceStatus::SubmittedSuccess
            | TaskInstanceStatus::Dispatched
            | TaskInstanceStatus::RunningExecution
            | TaskInstanceStatus::NeedFaultTolerance => Some(AttemptSeed::Failover(row)),
        }
    }

    async fn build_graph(
        &self,
        code: i64,
        version: i32,
        workflow_instance_id: Uuid,
        begin_nodes: &[String],
    ) -> anyhow::Result<WorkflowExecutionGraph> {
        let definitions =
            self.workflow_definition_repo.get_task_definitions(code, version).await?;
        let relations = self.workflow_definition_repo.get_task_relations(code, version).await?;

        let mut builder = WorkflowDag::builder();
        for definition in &definitions {
            builder = builder.add_node(DagNode::new(definition.name.clone()));
        }
        for relation in relations {
            builder = builder.add_edge(relation.from_node_name, relation.to_node_name);
        }
        let dag = builder.build()?;

        let mut graph = WorkflowExecutionGraph::new(dag, begin_nodes)?;
        for definition in definitions {
            graph.store_runnable(Arc::new(TaskExecutionRunnable::new(
                workflow_instance_id,
                definition,
            )));
        }
        Ok(graph)
    }
}

/// Turns the unfinished runs of a dead orchestrator host into failover
/// commands; whichever process owns each command's slot picks the run up.
#[derive(TypedBuilder)]
pub struct HostFailoverService {
    workflow_instance_repo: Arc<dyn WorkflowInstanceRepo>,
    command_repo: Arc<dyn CommandRepo>,
}

impl HostFailoverService {
    pub async fn failover_host(&self, dead_host: &str) -> anyhow::Result<usize> {
        let instances = self.workflow_instance_repo.get_unfinished_by_host(dead_host).await?;
        let count = instances.len();
        for instance in instances {
            tracing::warn!(
                workflow_instance_id = %instance.id,
                dead_host,
                "generating failover command"
            );
            self.command_repo
                .insert(&Command {
                    id: 0,
                    command_type: CommandType::FailoverWorkflow,
                    workflow_definition_code: instance.workflow_definition_code,
                    workflow_definition_version: instance.workflow_definition_version,
                    workflow_instance_id: Some(instance.id),
                    priority: instance.priority,
                    executor_id: instance.executor_id,
                    worker_group: instance.worker_group.clone(),
                    environment_code: instance.environment_code,
                    begin_nodes: vec![],
                    start_params: HashMap::new(),
                })
                .await?;
        }
        Ok(count)
    }
}
