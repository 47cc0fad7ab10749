//! File-system backup request and in-progress gate

use snapkeeper_core::store::BackupStore;
use snapkeeper_core::tags::{TAG_NAME, backup_tags};
use snapkeeper_core::{LifecycleError, SnapshotEvent};
use tracing::info;

/// Request a backup of a file system.
///
/// Bumps the attempt counter, derives the attempt's idempotency token, and
/// creates the backup with the resource's tags (reserved-namespace keys
/// stripped) plus provenance tags. The store's native token support makes
/// repeats of the same attempt return the existing backup.
pub async fn request_filesystem_backup(
    store: &impl BackupStore,
    mut event: SnapshotEvent,
) -> Result<SnapshotEvent, LifecycleError> {
    let request_id = event.begin_attempt();
    info!(
        file_system_id = %event.resource.id,
        attempt = event.attempt_count,
        "Requesting file system backup"
    );

    let tags = backup_tags(&event.resource.tags, &event.resource.id, &request_id);
    let record = store
        .create_backup(&event.resource.id, tags, &request_id)
        .await
        .map_err(|e| LifecycleError::from_store(e, &event))?;

    info!(
        file_system_id = %event.resource.id,
        backup_id = %record.id,
        "Backup requested"
    );
    event.resource_name = event.resource.tag_value(TAG_NAME).map(str::to_string);
    event.backup_in_progress = Some(record.lifecycle.is_creating());
    event.backup_id = Some(record.id);
    Ok(event)
}

/// Check whether any backup of the resource is still being created.
///
/// Conservative on purpose: a backup in a creating state blocks new backups
/// and cleanup even if something else created it, to avoid racing the
/// provider. Each active finding counts as an attempt so the caller can
/// bound its waits.
pub async fn check_backup_in_progress(
    store: &impl BackupStore,
    mut event: SnapshotEvent,
) -> Result<SnapshotEvent, LifecycleError> {
    let backups = store
        .backups_for_resource(&event.resource.id)
        .await
        .map_err(|e| LifecycleError::from_store(e, &event))?;

    let active = backups.iter().any(|b| b.lifecycle.is_creating());
    if active {
        event.record_pending();
        info!(
            file_system_id = %event.resource.id,
            attempt = event.attempt_count,
            "A backup is still being created"
        );
    }
    event.backup_in_progress = Some(active);
    Ok(event)
}
