use std::sync::Arc;

use chrono::{TimeZone, Utc};
use domain_workflow::model::entity::{TaskDefinition, TaskInstance, WorkflowInstance};
use domain_workflow::model::vo::{Priority, TaskExecutionContext};
use service_workflow::{GlobalTaskDispatchWaitingQueue, TaskExecutionRunnable};
use uuid::Uuid;

fn bound_runnable(
    task_code: i64,
    workflow_priority: Priority,
    task_priority: Priority,
    group_priority: i32,
    submitted_secs: i64,
) -> Arc<TaskExecutionRunnable> {
    let definition = TaskDefinition {
        code: task_code,
        name: format!("node-{task_code}"),
        ..Default::default()
    };
    let instance = TaskInstance {
        id: Uuid::new_v4(),
        task_code,
        priority: task_priority,
        task_group_priority: group_priority,
        submitted_at: Some(Utc.timestamp_opt(submitted_secs, 0).unwrap()),
        ..Default::default()
    };
    let context = TaskExecutionContext {
        workflow_definition: Default::default(),
        workflow_instance: WorkflowInstance::default(),
        task_definition: definition.clone(),
        task_instance: instance.clone(),
        environment: None,
    };
    let runnable = Arc::new(TaskExecutionRunnable::new(Uuid::new_v4(), definition));
    runnable.bind(instance, context, workflow_priority);
    runnable
}

#[test]
fn pops_in_the_dispatch_total_order() {
    let queue = GlobalTaskDispatchWaitingQueue::new();

    // (workflow, task, group, submit): (High, Lowest, 0, T0),
    // (High, Medium, 0, T1), (Medium, Highest, 0, T0). Workflow priority
    // dominates, then task priority; submit time only breaks full ties.
    let a = bound_runnable(1, Priority::High, Priority::Lowest, 0, 0);
    let b = bound_runnable(2, Priority::High, Priority::Medium, 0, 1);
    let c = bound_runnable(3, Priority::Medium, Priority::Highest, 0, 0);
    for runnable in [&a, &b, &c] {
        queue.submit(runnable.clone()).unwrap();
    }

    assert_eq!(queue.pop().unwrap().task_code, 2);
    assert_eq!(queue.pop().unwrap().task_code, 1);
    assert_eq!(queue.pop().unwrap().task_code, 3);
    assert!(queue.pop().is_none());
}

#[test]
fn higher_group_priority_beats_earlier_submit() {
    let queue = GlobalTaskDispatchWaitingQueue::new();
    let early_low_group = bound_runnable(1, Priority::Medium, Priority::Medium, 1, 0);
    let late_high_group = bound_runnable(2, Priority::Medium, Priority::Medium, 5, 100);
    queue.submit(early_low_group).unwrap();
    queue.submit(late_high_group).unwrap();

    assert_eq!(queue.pop().unwrap().task_code, 2);
    assert_eq!(queue.pop().unwrap().task_code, 1);
}

#[test]
fn equal_keys_pop_by_earlier_submit() {
    let queue = GlobalTaskDispatchWaitingQueue::new();
    let late = bound_runnable(1, Priority::Medium, Priority::Medium, 3, 50);
    let early = bound_runnable(2, Priority::Medium, Priority::Medium, 3, 10);
    queue.submit(late).unwrap();
    queue.submit(early).unwrap();

    assert_eq!(queue.pop().unwrap().task_code, 2);
    assert_eq!(queue.pop().unwrap().task_code, 1);
}

#[test]
fn unbound_runnables_are_refused() {
    let queue = GlobalTaskDispatchWaitingQueue::new();
    let unbound = Arc::new(TaskExecutionRunnable::new(
        Uuid::new_v4(),
        TaskDefinition::default(),
    ));
    assert!(queue.submit(unbound).is_err());
    assert!(queue.is_empty());
}

#[tokio::test]
async fn pop_wait_wakes_on_submit() {
    let queue = Arc::new(GlobalTaskDispatchWaitingQueue::new());
    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.pop_wait().await.task_code })
    };
    tokio::task::yield_now().await;
    queue.submit(bound_runnable(9, Priority::Medium, Priority::Medium, 0, 0)).unwrap();
    let code = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code, 9);
}
