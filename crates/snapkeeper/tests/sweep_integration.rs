//! Integration tests for the retention sweeps

use chrono::{Duration as ChronoDuration, Utc};
use snapkeeper::steps::{sweep_filesystem_backups, sweep_instance_snapshots};
use snapkeeper_core::retention::{RetentionUnit, RetentionWindow};
use snapkeeper_core::store::RecordLifecycle;
use snapkeeper_core::tags::{
    TAG_CREATED_BY, TAG_CREATED_BY_VALUE, TAG_FILE_SYSTEM_ID, TAG_INSTANCE_ID,
};
use snapkeeper_core::{ResourceKind, ResourceRef, SnapshotEvent, Tag};
use snapkeeper_test_utils::{FakeBackupStore, FakeSnapshotStore, backup_record};
use std::time::Duration;

const NO_PACING: Duration = Duration::ZERO;

fn seven_days() -> RetentionWindow {
    RetentionWindow::new(RetentionUnit::Days, 7)
}

fn fs_event(id: &str) -> SnapshotEvent {
    let mut event = SnapshotEvent::new(ResourceRef::new(id, ResourceKind::FileSystem, vec![]));
    event.backup_in_progress = Some(false);
    event
}

fn instance_event(id: &str) -> SnapshotEvent {
    SnapshotEvent::new(ResourceRef::new(id, ResourceKind::Instance, vec![]))
}

fn ours(fs_id: &str) -> Vec<Tag> {
    vec![
        Tag::new(TAG_CREATED_BY, TAG_CREATED_BY_VALUE),
        Tag::new(TAG_FILE_SYSTEM_ID, fs_id),
    ]
}

#[tokio::test]
async fn retention_scenario_deletes_only_expired_self_created() {
    // fs-001, 7 day window: 10d-old self-created backup goes, 3d-old
    // self-created stays, 20d-old foreign backup is never touched
    let now = Utc::now();
    let store = FakeBackupStore::with_records(vec![
        backup_record(
            "b-10d",
            "fs-001",
            now - ChronoDuration::days(10),
            RecordLifecycle::Available,
            ours("fs-001"),
        ),
        backup_record(
            "b-3d",
            "fs-001",
            now - ChronoDuration::days(3),
            RecordLifecycle::Available,
            ours("fs-001"),
        ),
        backup_record(
            "b-20d-foreign",
            "fs-001",
            now - ChronoDuration::days(20),
            RecordLifecycle::Available,
            vec![
                Tag::new(TAG_CREATED_BY, "some-other-tool"),
                Tag::new(TAG_FILE_SYSTEM_ID, "fs-001"),
            ],
        ),
    ]);

    let report = sweep_filesystem_backups(&store, &fs_event("fs-001"), seven_days(), NO_PACING)
        .await
        .unwrap();

    assert_eq!(report.deleted, vec!["b-10d"]);
    assert!(report.failed.is_empty());

    let remaining: Vec<String> = store.records().into_iter().map(|r| r.id).collect();
    assert!(remaining.contains(&"b-3d".to_string()));
    assert!(remaining.contains(&"b-20d-foreign".to_string()));
}

#[tokio::test]
async fn snapshot_sweep_orders_deletions_newest_first() {
    let now = Utc::now();
    let provenance = vec![
        Tag::new(TAG_CREATED_BY, TAG_CREATED_BY_VALUE),
        Tag::new(TAG_INSTANCE_ID, "i-0abc123"),
    ];
    let store = FakeSnapshotStore::with_records(vec![
        backup_record("snap-30d", "i-0abc123", now - ChronoDuration::days(30), RecordLifecycle::Available, provenance.clone()),
        backup_record("snap-8d", "i-0abc123", now - ChronoDuration::days(8), RecordLifecycle::Available, provenance.clone()),
        backup_record("snap-15d", "i-0abc123", now - ChronoDuration::days(15), RecordLifecycle::Available, provenance.clone()),
        backup_record("snap-1d", "i-0abc123", now - ChronoDuration::days(1), RecordLifecycle::Available, provenance),
    ]);

    let report = sweep_instance_snapshots(&store, &instance_event("i-0abc123"), seven_days(), NO_PACING)
        .await
        .unwrap();

    // Interrupting after the first deletion would leave the two oldest
    assert_eq!(report.deleted, vec!["snap-8d", "snap-15d", "snap-30d"]);
}

#[tokio::test]
async fn snapshot_sweep_survives_individual_delete_failures() {
    let now = Utc::now();
    let provenance = vec![Tag::new(TAG_CREATED_BY, TAG_CREATED_BY_VALUE)];
    let store = FakeSnapshotStore::with_records(vec![
        backup_record("snap-a", "i-1", now - ChronoDuration::days(8), RecordLifecycle::Available, provenance.clone()),
        backup_record("snap-b", "i-1", now - ChronoDuration::days(12), RecordLifecycle::Available, provenance.clone()),
        backup_record("snap-c", "i-1", now - ChronoDuration::days(16), RecordLifecycle::Available, provenance),
    ])
    .failing_deletes(&["snap-a", "snap-c"]);

    let report = sweep_instance_snapshots(&store, &instance_event("i-1"), seven_days(), NO_PACING)
        .await
        .unwrap();

    // The sweep as a whole still succeeds
    assert_eq!(report.deleted, vec!["snap-b"]);
    assert_eq!(report.failed, vec!["snap-a", "snap-c"]);
}

#[tokio::test]
async fn short_retention_units_are_honored() {
    let now = Utc::now();
    let store = FakeBackupStore::with_records(vec![
        backup_record(
            "b-old-minutes",
            "fs-001",
            now - ChronoDuration::minutes(90),
            RecordLifecycle::Available,
            ours("fs-001"),
        ),
        backup_record(
            "b-fresh-minutes",
            "fs-001",
            now - ChronoDuration::minutes(10),
            RecordLifecycle::Available,
            ours("fs-001"),
        ),
    ]);

    let window = RetentionWindow::new(RetentionUnit::Minutes, 30);
    let report = sweep_filesystem_backups(&store, &fs_event("fs-001"), window, NO_PACING)
        .await
        .unwrap();

    assert_eq!(report.deleted, vec!["b-old-minutes"]);
}

#[tokio::test]
async fn empty_store_sweeps_to_nothing() {
    let store = FakeBackupStore::new();

    let report = sweep_filesystem_backups(&store, &fs_event("fs-001"), seven_days(), NO_PACING)
        .await
        .unwrap();

    assert!(report.deleted.is_empty());
    assert!(report.failed.is_empty());
}
