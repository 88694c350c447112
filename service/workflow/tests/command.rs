mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::harness::{harness, TestHarness};
use domain_workflow::model::entity::{
    Command, CommandType, Flag, TaskDefinition, TaskInstance, TaskInstanceStatus,
    WorkflowInstance, WorkflowInstanceStatus,
};
use domain_workflow::model::vo::DagEdge;
use domain_workflow::repository::CommandRepo;
use domain_workflow::{mock::MockWorkflowDefinitionRepo, model::entity::WorkflowDefinition};
use service_workflow::{CommandFetchService, HostFailoverService, SlotAssignment};
use uuid::Uuid;

/// Command backlog fake with storage-assigned ids.
#[derive(Default)]
struct FakeCommandRepo {
    rows: Mutex<Vec<Command>>,
    next_id: Mutex<i64>,
}

#[async_trait::async_trait]
impl CommandRepo for FakeCommandRepo {
    async fn insert(&self, command: &Command) -> anyhow::Result<()> {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let mut row = command.clone();
        row.id = *next;
        self.rows.lock().unwrap().push(row);
        Ok(())
    }

    async fn fetch_page(&self, last_seen_id: i64, limit: u64) -> anyhow::Result<Vec<Command>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.id > last_seen_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() < before)
    }
}

fn definition_repo() -> Arc<MockWorkflowDefinitionRepo> {
    let mut repo = MockWorkflowDefinitionRepo::new();
    repo.expect_get_by_code_version().returning(|code, version| {
        Ok(WorkflowDefinition {
            code,
            version,
            name: "etl".into(),
            global_params: HashMap::from([("env".into(), "prod".into())]),
        })
    });
    repo.expect_get_task_definitions().returning(|_, _| {
        Ok(vec![
            TaskDefinition {
                code: 1,
                name: "a".into(),
                ..Default::default()
            },
            TaskDefinition {
                code: 2,
                name: "b".into(),
                ..Default::default()
            },
        ])
    });
    repo.expect_get_task_relations().returning(|_, _| {
        Ok(vec![DagEdge {
            from_node_name: "a".into(),
            to_node_name: "b".into(),
        }])
    });
    Arc::new(repo)
}

fn fetch_service(
    h: &TestHarness,
    commands: &Arc<FakeCommandRepo>,
    assignment: SlotAssignment,
) -> CommandFetchService {
    CommandFetchService::builder()
        .command_repo(commands.clone())
        .workflow_definition_repo(definition_repo())
        .workflow_instance_repo(h.store.clone())
        .task_instance_repo(h.store.clone())
        .engine(h.engine.clone())
        .assignment(assignment)
        .host("master-1:5678".into())
        .build()
}

fn start_command() -> Command {
    Command {
        command_type: CommandType::StartWorkflow,
        workflow_definition_code: 100,
        workflow_definition_version: 1,
        start_params: HashMap::from([("day".into(), "2024-06-01".into())]),
        ..Default::default()
    }
}

#[tokio::test]
async fn claimed_start_command_expands_into_a_triggered_run() {
    let h = harness();
    let commands = Arc::new(FakeCommandRepo::default());
    commands.insert(&start_command()).await.unwrap();

    let service = fetch_service(
        &h,
        &commands,
        SlotAssignment {
            slot: 0,
            total_slots: 1,
            id_step: 1,
        },
    );
    assert_eq!(service.poll_once().await.unwrap(), 1);

    // Consumed from the backlog, expanded into a registered instance.
    assert!(commands.rows.lock().unwrap().is_empty());
    assert_eq!(h.engine.active_count(), 1);
    let wf = h.store.workflow_instances.lock().unwrap().values().next().cloned().unwrap();
    assert_eq!(wf.workflow_definition_code, 100);
    assert_eq!(wf.host.as_deref(), Some("master-1:5678"));
    // Start params override the definition's global params seed.
    assert_eq!(wf.variable_pool.get("env").map(String::as_str), Some("prod"));
    assert_eq!(wf.variable_pool.get("day").map(String::as_str), Some("2024-06-01"));

    // The trigger reached the entry node.
    let entry = tokio::time::timeout(Duration::from_secs(5), h.queue.pop_wait()).await.unwrap();
    assert_eq!(entry.task_code, 1);
}

#[tokio::test]
async fn unclaimed_commands_are_left_for_their_slot_owner() {
    let h = harness();
    let commands = Arc::new(FakeCommandRepo::default());
    commands.insert(&start_command()).await.unwrap(); // id 1

    // Two-slot cluster; id 1 belongs to slot 1, we are slot 0.
    let service = fetch_service(
        &h,
        &commands,
        SlotAssignment {
            slot: 0,
            total_slots: 2,
            id_step: 1,
        },
    );
    assert_eq!(service.poll_once().await.unwrap(), 0);
    assert_eq!(commands.rows.lock().unwrap().len(), 1);
    assert_eq!(h.engine.active_count(), 0);
}

#[tokio::test]
async fn pause_recovery_resumes_the_paused_attempt_in_place() {
    let h = harness();
    let commands = Arc::new(FakeCommandRepo::default());

    let instance_id = Uuid::new_v4();
    h.store.workflow_instances.lock().unwrap().insert(
        instance_id,
        WorkflowInstance {
            id: instance_id,
            workflow_definition_code: 100,
            workflow_definition_version: 1,
            status: WorkflowInstanceStatus::Paused,
            host: Some("master-0:5678".into()),
            ..Default::default()
        },
    );
    let succeeded = TaskInstance {
        id: Uuid::new_v4(),
        task_code: 1,
        name: "a".into(),
        workflow_instance_id: instance_id,
        status: TaskInstanceStatus::Success,
        flag: Flag::Active,
        ..Default::default()
    };
    let paused = TaskInstance {
        id: Uuid::new_v4(),
        task_code: 2,
        name: "b".into(),
        workflow_instance_id: instance_id,
        status: TaskInstanceStatus::Paused,
        flag: Flag::Active,
        ..Default::default()
    };
    {
        let mut rows = h.store.task_instances.lock().unwrap();
        rows.insert(succeeded.id, succeeded.clone());
        rows.insert(paused.id, paused.clone());
    }
    commands
        .insert(&Command {
            command_type: CommandType::RecoverFromPause,
            workflow_definition_code: 100,
            workflow_definition_version: 1,
            workflow_instance_id: Some(instance_id),
            ..Default::default()
        })
        .await
        .unwrap();

    let service = fetch_service(
        &h,
        &commands,
        SlotAssignment {
            slot: 0,
            total_slots: 1,
            id_step: 1,
        },
    );
    assert_eq!(service.poll_once().await.unwrap(), 1);
    assert!(h.engine.contains(instance_id));

    // The paused node comes back through the pipeline as the same row.
    let resumed = tokio::time::timeout(Duration::from_secs(5), h.queue.pop_wait()).await.unwrap();
    assert_eq!(resumed.task_code, 2);
    let row = h.store.task_instances.lock().unwrap().get(&paused.id).cloned().unwrap();
    assert_eq!(row.status, TaskInstanceStatus::SubmittedSuccess);
    // The new owner took the run over.
    let wf = h.store.workflow_instances.lock().unwrap().get(&instance_id).cloned().unwrap();
    assert_eq!(wf.host.as_deref(), Some("master-1:5678"));
}

#[tokio::test]
async fn host_failover_turns_orphaned_runs_into_commands() {
    let h = harness();
    let commands = Arc::new(FakeCommandRepo::default());
    let orphan_id = Uuid::new_v4();
    h.store.workflow_instances.lock().unwrap().insert(
        orphan_id,
        WorkflowInstance {
            id: orphan_id,
            workflow_definition_code: 100,
            workflow_definition_version: 1,
            status: WorkflowInstanceStatus::Running,
            host: Some("dead-master:5678".into()),
            ..Default::default()
        },
    );

    let service = HostFailoverService::builder()
        .workflow_instance_repo(h.store.clone())
        .command_repo(commands.clone())
        .build();
    assert_eq!(service.failover_host("dead-master:5678").await.unwrap(), 1);

    let rows = commands.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].command_type, CommandType::FailoverWorkflow);
    assert_eq!(rows[0].workflow_instance_id, Some(orphan_id));
}
