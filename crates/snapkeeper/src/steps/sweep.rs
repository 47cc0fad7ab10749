//! Retention sweeps
//!
//! Deletes snapshots/backups that have reached the retention window, scoped
//! strictly to records carrying this tool's provenance tag. Deletion is
//! best-effort: one failed delete is logged and the sweep continues.

use chrono::Utc;
use serde::Serialize;
use snapkeeper_core::retention::{RetentionWindow, expired_newest_first};
use snapkeeper_core::store::{BackupRecord, BackupStore, SnapshotStore};
use snapkeeper_core::tags::TAG_FILE_SYSTEM_ID;
use snapkeeper_core::{LifecycleError, SnapshotEvent};
use std::time::Duration;
use tracing::{info, warn};

/// Pacing between deletions, to stay under provider rate limits
pub const DELETE_PACING: Duration = Duration::from_secs(1);

/// Outcome of one retention sweep
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SweepReport {
    /// Record ids deleted, in deletion order
    pub deleted: Vec<String>,
    /// Record ids whose deletion failed and was skipped
    pub failed: Vec<String>,
}

/// Delete expired snapshots created by this tool for an instance.
pub async fn sweep_instance_snapshots(
    store: &impl SnapshotStore,
    event: &SnapshotEvent,
    window: RetentionWindow,
    pacing: Duration,
) -> Result<SweepReport, LifecycleError> {
    let records = store
        .snapshots_created_for(&event.resource.id)
        .await
        .map_err(|e| LifecycleError::from_store(e, event))?;

    let expired = plan(records, window, &event.resource.id);
    let mut report = SweepReport::default();
    for record in expired {
        match store.delete_snapshot(&record.id).await {
            Ok(()) => {
                info!(
                    snapshot_id = %record.id,
                    created_at = %record.created_at,
                    "Deleted expired snapshot"
                );
                report.deleted.push(record.id);
            }
            Err(e) => {
                warn!(
                    snapshot_id = %record.id,
                    error = %e,
                    "Snapshot delete failed, continuing sweep"
                );
                report.failed.push(record.id);
            }
        }
        tokio::time::sleep(pacing).await;
    }
    Ok(report)
}

/// Delete expired backups created by this tool for a file system.
///
/// Only runs once the gate step has confirmed no backup is being created;
/// an event that never passed the gate, or reports one still active, is
/// skipped untouched.
pub async fn sweep_filesystem_backups(
    store: &impl BackupStore,
    event: &SnapshotEvent,
    window: RetentionWindow,
    pacing: Duration,
) -> Result<SweepReport, LifecycleError> {
    if event.resource.kind.requires_backup_gate() && event.backup_in_progress != Some(false) {
        warn!(
            file_system_id = %event.resource.id,
            backup_in_progress = ?event.backup_in_progress,
            "Backup state not confirmed clear, skipping sweep"
        );
        return Ok(SweepReport::default());
    }

    let records = store
        .user_initiated_backups()
        .await
        .map_err(|e| LifecycleError::from_store(e, event))?;
    let records: Vec<BackupRecord> = records
        .into_iter()
        .filter(|r| r.tag_value(TAG_FILE_SYSTEM_ID) == Some(event.resource.id.as_str()))
        .collect();

    let expired = plan(records, window, &event.resource.id);
    let mut report = SweepReport::default();
    for record in expired {
        match store.delete_backup(&record.id).await {
            Ok(()) => {
                info!(
                    backup_id = %record.id,
                    created_at = %record.created_at,
                    "Deleted expired backup"
                );
                report.deleted.push(record.id);
            }
            Err(e) => {
                warn!(
                    backup_id = %record.id,
                    error = %e,
                    "Backup delete failed, continuing sweep"
                );
                report.failed.push(record.id);
            }
        }
        tokio::time::sleep(pacing).await;
    }
    Ok(report)
}

/// Keep only provenance-tagged records, then select the expired ones.
fn plan(records: Vec<BackupRecord>, window: RetentionWindow, resource_id: &str) -> Vec<BackupRecord> {
    let candidates: Vec<BackupRecord> = records
        .into_iter()
        .filter(BackupRecord::is_self_created)
        .collect();
    let cutoff = window.cutoff(Utc::now());
    let expired = expired_newest_first(candidates, cutoff);
    info!(
        resource_id = %resource_id,
        count = expired.len(),
        cutoff = %cutoff,
        "Purging records older than cutoff"
    );
    expired
}
