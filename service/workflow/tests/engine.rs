mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::harness::{harness, TestHarness};
use domain_workflow::exception::WorkflowException;
use domain_workflow::model::entity::{
    Flag, TaskDefinition, TaskInstanceStatus, WorkflowDefinition, WorkflowInstance,
    WorkflowInstanceStatus,
};
use domain_workflow::model::vo::msg::{TaskExecutionEventMsg, TaskStateChange};
use domain_workflow::model::vo::{DagNode, WorkflowDag};
use service_workflow::{TaskExecutionRunnable, WorkflowExecutionGraph};
use uuid::Uuid;

fn two_node_definition(max_retry_times: u32) -> (Arc<WorkflowDefinition>, Vec<TaskDefinition>, WorkflowDag) {
    let definition = Arc::new(WorkflowDefinition {
        code: 100,
        version: 1,
        name: "etl".into(),
        global_params: HashMap::new(),
    });
    let tasks = vec![
        TaskDefinition {
            code: 1,
            name: "a".into(),
            max_retry_times,
            ..Default::default()
        },
        TaskDefinition {
            code: 2,
            name: "b".into(),
            max_retry_times,
            ..Default::default()
        },
    ];
    let dag = WorkflowDag::builder()
        .add_node(DagNode::new("a"))
        .add_node(DagNode::new("b"))
        .add_edge("a", "b")
        .build()
        .unwrap();
    (definition, tasks, dag)
}

fn spawn_two_node_workflow(h: &TestHarness, max_retry_times: u32) -> Uuid {
    let (definition, tasks, dag) = two_node_definition(max_retry_times);
    let instance = WorkflowInstance {
        id: Uuid::new_v4(),
        name: "etl-run".into(),
        workflow_definition_code: 100,
        workflow_definition_version: 1,
        status: WorkflowInstanceStatus::Created,
        ..Default::default()
    };
    h.store.workflow_instances.lock().unwrap().insert(instance.id, instance.clone());

    let mut graph = WorkflowExecutionGraph::new(dag, &[]).unwrap();
    for task in tasks {
        graph.store_runnable(Arc::new(TaskExecutionRunnable::new(instance.id, task)));
    }
    let id = instance.id;
    h.engine.spawn_workflow(definition, instance, graph, HashMap::new());
    id
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}

async fn pop_dispatched(h: &TestHarness) -> Arc<TaskExecutionRunnable> {
    tokio::time::timeout(Duration::from_secs(5), h.queue.pop_wait()).await.unwrap()
}

fn task_event(workflow_instance_id: Uuid, task_code: i64, change: TaskStateChange) -> TaskExecutionEventMsg {
    TaskExecutionEventMsg {
        workflow_instance_id,
        task_code,
        change,
    }
}

#[tokio::test]
async fn operations_on_unknown_instances_raise_not_found() {
    let h = harness();
    let ghost = Uuid::new_v4();

    for result in [
        h.engine.trigger_workflow(ghost),
        h.engine.pause_workflow(ghost),
        h.engine.kill_workflow(ghost),
    ] {
        match result {
            Err(WorkflowException::WorkflowInstanceNotFound { id }) => assert_eq!(id, ghost),
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    // Finalize is the one idempotent exception.
    assert!(h.engine.finalize_workflow(ghost).is_ok());
    assert!(h.engine.finalize_workflow(ghost).is_ok());
}

#[tokio::test]
async fn workflow_runs_nodes_in_dag_order_to_completion() {
    let h = harness();
    let id = spawn_two_node_workflow(&h, 0);
    assert!(h.engine.contains(id));
    h.engine.trigger_workflow(id).unwrap();

    // Only the entry node is materialized and queued.
    let first = pop_dispatched(&h).await;
    assert_eq!(first.task_code, 1);
    assert!(h.queue.is_empty());

    h.engine
        .on_task_event(task_event(id, 1, TaskStateChange::Dispatched { host: "w1:1234".into() }))
        .unwrap();
    h.engine.on_task_event(task_event(id, 1, TaskStateChange::Running)).unwrap();
    h.engine
        .on_task_event(task_event(
            id,
            1,
            TaskStateChange::Succeeded {
                variable_pool: HashMap::from([("rows".into(), "42".into())]),
            },
        ))
        .unwrap();

    // Success of the predecessor releases the successor.
    let second = pop_dispatched(&h).await;
    assert_eq!(second.task_code, 2);
    h.engine
        .on_task_event(task_event(id, 2, TaskStateChange::Dispatched { host: "w1:1234".into() }))
        .unwrap();
    h.engine.on_task_event(task_event(id, 2, TaskStateChange::Running)).unwrap();
    h.engine
        .on_task_event(task_event(
            id,
            2,
            TaskStateChange::Succeeded {
                variable_pool: HashMap::new(),
            },
        ))
        .unwrap();

    let store = h.store.clone();
    wait_until(move || {
        store
            .workflow_instances
            .lock()
            .unwrap()
            .get(&id)
            .map(|w| w.status == WorkflowInstanceStatus::Completed)
            .unwrap_or(false)
    })
    .await;

    // Finalize already removed the runnable; the pool change survived.
    assert!(!h.engine.contains(id));
    let wf = h.store.workflow_instances.lock().unwrap().get(&id).cloned().unwrap();
    assert_eq!(wf.variable_pool.get("rows").map(String::as_str), Some("42"));
    for code in [1, 2] {
        let rows = h.store.active_rows(code);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, TaskInstanceStatus::Success);
    }
}

#[tokio::test]
async fn failed_attempt_is_retried_then_fails_the_workflow() {
    let h = harness();
    let id = spawn_two_node_workflow(&h, 1);
    h.engine.trigger_workflow(id).unwrap();

    let first = pop_dispatched(&h).await;
    assert_eq!(first.task_code, 1);
    h.engine
        .on_task_event(task_event(id, 1, TaskStateChange::Dispatched { host: "w1:1234".into() }))
        .unwrap();
    h.engine
        .on_task_event(task_event(id, 1, TaskStateChange::Failed { message: Some("boom".into()) }))
        .unwrap();

    // Retry budget of one: a fresh attempt replaces the failed row.
    let retried = pop_dispatched(&h).await;
    assert_eq!(retried.task_code, 1);
    let store = h.store.clone();
    wait_until(move || store.rows(1).len() == 2).await;
    let active = h.store.active_rows(1);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].retry_times, 1);

    // Second failure exhausts the budget and settles the run as failed.
    h.engine
        .on_task_event(task_event(id, 1, TaskStateChange::Dispatched { host: "w1:1234".into() }))
        .unwrap();
    h.engine
        .on_task_event(task_event(id, 1, TaskStateChange::Failed { message: Some("boom".into()) }))
        .unwrap();

    let store = h.store.clone();
    wait_until(move || {
        store
            .workflow_instances
            .lock()
            .unwrap()
            .get(&id)
            .map(|w| w.status == WorkflowInstanceStatus::Failed)
            .unwrap_or(false)
    })
    .await;
    assert!(!h.engine.contains(id));
    // The successor never got an attempt.
    assert!(h.store.rows(2).is_empty());
}

#[tokio::test]
async fn kill_settles_queued_attempts_without_remote_calls() {
    let h = harness();
    let id = spawn_two_node_workflow(&h, 0);
    h.engine.trigger_workflow(id).unwrap();

    // Entry attempt exists but was never dispatched (no host yet).
    let store = h.store.clone();
    wait_until(move || !store.rows(1).is_empty()).await;

    h.engine.kill_workflow(id).unwrap();

    let store = h.store.clone();
    wait_until(move || {
        store
            .workflow_instances
            .lock()
            .unwrap()
            .get(&id)
            .map(|w| w.status == WorkflowInstanceStatus::Killed)
            .unwrap_or(false)
    })
    .await;
    assert!(!h.engine.contains(id));

    let rows = h.store.rows(1);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, TaskInstanceStatus::Kill);
    assert_eq!(rows[0].flag, Flag::Active);
    assert!(rows[0].ended_at.is_some());
}

#[tokio::test]
async fn pause_then_finalize_leaves_paused_rows_behind() {
    let h = harness();
    let id = spawn_two_node_workflow(&h, 0);
    h.engine.trigger_workflow(id).unwrap();
    let store = h.store.clone();
    wait_until(move || !store.rows(1).is_empty()).await;

    h.engine.pause_workflow(id).unwrap();

    let store = h.store.clone();
    wait_until(move || {
        store
            .workflow_instances
            .lock()
            .unwrap()
            .get(&id)
            .map(|w| w.status == WorkflowInstanceStatus::Paused)
            .unwrap_or(false)
    })
    .await;
    // A paused run leaves the in-memory repository; recovery re-creates it.
    assert!(!h.engine.contains(id));
    let rows = h.store.rows(1);
    assert_eq!(rows[0].status, TaskInstanceStatus::Paused);
}
