//! Integration tests for the full lifecycle step chains
//!
//! Drives the stateless steps the way the workflow would, with in-memory
//! fakes standing in for the provider.

use snapkeeper::discovery::{WorkflowInput, trigger_workflow};
use snapkeeper::steps::{
    check_backup_in_progress, poll_execution, request_filesystem_backup,
    request_instance_snapshot,
};
use snapkeeper_core::{ExecutionStatus, ResourceKind, ResourceRef, SnapshotEvent, Tag};
use snapkeeper_test_utils::{
    FakeBackupStore, FakeExecutor, FakeParameterSource, FakeWorkflowStarter,
};

const DOC_PARAM: &str = "/snapkeeper/snapshot-document";
const ARN: &str = "arn:aws:states:us-east-2:123456789012:stateMachine:snapkeeper";

fn instance() -> ResourceRef {
    ResourceRef::new(
        "i-0abc123",
        ResourceKind::Instance,
        vec![Tag::new("Name", "db-primary")],
    )
}

fn file_system() -> ResourceRef {
    ResourceRef::new(
        "fs-001",
        ResourceKind::FileSystem,
        vec![Tag::new("Name", "shared-fs")],
    )
}

#[tokio::test]
async fn instance_lifecycle_reaches_success() {
    let executor = FakeExecutor::new();
    let parameters = FakeParameterSource::with_parameter(DOC_PARAM, "snapkeeper-snapshot");
    executor.script_statuses("exec-1", &["Pending", "InProgress", "Success"]);

    let event = SnapshotEvent::new(instance());
    let event = request_instance_snapshot(&executor, &parameters, DOC_PARAM, event)
        .await
        .unwrap();
    assert_eq!(event.status, ExecutionStatus::InProgress);

    // The workflow polls until a terminal state shows up
    let mut event = event;
    let mut polls = 0;
    while !event.is_terminal() {
        event = poll_execution(&executor, event).await.unwrap();
        polls += 1;
        assert!(polls < 10, "poller never reached a terminal state");
    }

    assert_eq!(event.status, ExecutionStatus::Success);
    assert!(event.failure().is_none());
    // 1 request + 2 pending polls; the terminal poll does not count
    assert_eq!(event.attempt_count, 3);
}

#[tokio::test]
async fn instance_lifecycle_records_failure() {
    let executor = FakeExecutor::new();
    let parameters = FakeParameterSource::with_parameter(DOC_PARAM, "snapkeeper-snapshot");
    executor.script_statuses("exec-1", &["InProgress", "TimedOut"]);

    let event = request_instance_snapshot(&executor, &parameters, DOC_PARAM, SnapshotEvent::new(instance()))
        .await
        .unwrap();
    let event = poll_execution(&executor, event).await.unwrap();
    assert_eq!(event.status, ExecutionStatus::InProgress);
    let event = poll_execution(&executor, event).await.unwrap();

    assert_eq!(event.status, ExecutionStatus::Failed);
    let failure = event.failure().expect("terminal failure is recorded");
    let msg = failure.to_string();
    assert!(msg.contains("i-0abc123"));
    assert!(msg.contains("exec-1"));
}

#[tokio::test]
async fn attempt_count_never_decreases_across_step_chain() {
    let executor = FakeExecutor::new();
    let parameters = FakeParameterSource::with_parameter(DOC_PARAM, "snapkeeper-snapshot");
    executor.script_statuses("exec-1", &["Pending", "Pending", "Pending", "Success"]);

    let mut event = SnapshotEvent::new(instance());
    let mut counts = vec![event.attempt_count];

    event = request_instance_snapshot(&executor, &parameters, DOC_PARAM, event)
        .await
        .unwrap();
    counts.push(event.attempt_count);

    for _ in 0..4 {
        event = poll_execution(&executor, event).await.unwrap();
        counts.push(event.attempt_count);
    }

    assert!(
        counts.windows(2).all(|w| w[0] <= w[1]),
        "attempt counts decreased: {counts:?}"
    );
}

#[tokio::test]
async fn filesystem_backup_then_gate_clears() {
    let store = FakeBackupStore::new();

    let event = request_filesystem_backup(&store, SnapshotEvent::new(file_system()))
        .await
        .unwrap();
    assert_eq!(event.backup_in_progress, Some(true));
    assert_eq!(event.resource_name.as_deref(), Some("shared-fs"));
    let backup_id = event.backup_id.clone().unwrap();

    // Gate sees the fresh backup still creating
    let event = check_backup_in_progress(&store, event).await.unwrap();
    assert_eq!(event.backup_in_progress, Some(true));

    // The store finishes the backup; remove-and-reseed as available
    let mut records = store.records();
    records[0].lifecycle = snapkeeper_core::store::RecordLifecycle::Available;
    let store = FakeBackupStore::with_records(records);

    let event = check_backup_in_progress(&store, event).await.unwrap();
    assert_eq!(event.backup_in_progress, Some(false));
    assert_eq!(event.backup_id.as_deref(), Some(backup_id.as_str()));
}

#[tokio::test]
async fn same_token_twice_creates_at_most_one_backup() {
    let store = FakeBackupStore::new();

    // At-least-once delivery: the workflow runs the request step twice with
    // the same input event
    let input = SnapshotEvent::new(file_system());
    let first = request_filesystem_backup(&store, input.clone()).await.unwrap();
    let second = request_filesystem_backup(&store, input).await.unwrap();

    assert_eq!(first.request_id, second.request_id);
    assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn trigger_payload_round_trips_through_workflow_input() {
    let starter = FakeWorkflowStarter::new();

    trigger_workflow(&starter, ARN, vec![instance()], vec![file_system()])
        .await
        .unwrap()
        .expect("resources discovered, workflow starts");

    let (arn, payload) = starter.starts().remove(0);
    assert_eq!(arn, ARN);

    let input: WorkflowInput = serde_json::from_str(&payload).unwrap();
    assert_eq!(input.instances.len(), 1);
    assert_eq!(input.file_systems.len(), 1);

    // Discovery-fresh events are ready for the first step
    let event = &input.instances[0];
    assert_eq!(event.attempt_count, 0);
    assert_eq!(event.status, ExecutionStatus::Unknown);
    assert!(event.request_id.is_none());
}
