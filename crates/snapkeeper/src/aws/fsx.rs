//! FSx file system discovery and backup store access

use super::context::AwsContext;
use super::error::store_error;
use anyhow::{Context, Result, anyhow};
use aws_sdk_fsx::Client;
use aws_sdk_fsx::types::{
    Backup, BackupLifecycle as FsxBackupLifecycle, FileSystemLifecycle, Filter, FilterName,
    Tag as FsxTag,
};
use chrono::{DateTime, Utc};
use snapkeeper_core::store::{BackupRecord, BackupStore, RecordLifecycle};
use snapkeeper_core::tags::{TAG_FILE_SYSTEM_ID, has_tag};
use snapkeeper_core::{ResourceKind, ResourceRef, StoreError, Tag};
use tracing::debug;

/// FSx client for file system discovery and backup lifecycle access
pub struct FsxClient {
    client: Client,
}

impl FsxClient {
    /// Create a new FSx client
    pub fn new(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.fsx_client(),
        }
    }

    /// Discover available file systems carrying the given tag pair.
    ///
    /// The describe API has no tag filter, so selection happens client-side
    /// over the paginated listing.
    pub async fn discover_tagged_file_systems(
        &self,
        tag_key: &str,
        tag_value: &str,
    ) -> Result<Vec<ResourceRef>> {
        let mut resources = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_file_systems()
                .set_next_token(next_token.clone())
                .send()
                .await
                .context("Failed to describe file systems")?;

            for fs in response.file_systems() {
                if !matches!(fs.lifecycle(), Some(FileSystemLifecycle::Available)) {
                    continue;
                }
                let tags = from_fsx_tags(fs.tags());
                if !has_tag(&tags, tag_key, tag_value) {
                    continue;
                }
                if let Some(id) = fs.file_system_id() {
                    resources.push(ResourceRef::new(id, ResourceKind::FileSystem, tags));
                }
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!(count = resources.len(), "Found tagged file systems");
        Ok(resources)
    }

    async fn list_backups(
        &self,
        filter: Filter,
        parent_hint: Option<&str>,
    ) -> Result<Vec<BackupRecord>, StoreError> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_backups()
                .filters(filter.clone())
                .set_next_token(next_token.clone())
                .send()
                .await
                .map_err(|e| store_error("backups", e))?;

            for backup in response.backups() {
                records.push(record_from_backup(backup, parent_hint));
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(records)
    }
}

fn from_fsx_tags(tags: &[FsxTag]) -> Vec<Tag> {
    tags.iter().map(|t| Tag::new(t.key(), t.value())).collect()
}

fn to_fsx_tags(tags: &[Tag]) -> Result<Vec<FsxTag>, StoreError> {
    tags.iter()
        .map(|t| {
            FsxTag::builder()
                .key(&t.key)
                .value(&t.value)
                .build()
                .map_err(|e| StoreError::Other(anyhow::Error::new(e)))
        })
        .collect()
}

/// Map a store backup into the lifecycle record shape.
///
/// The parent file system comes from the call context when the listing was
/// already scoped to one file system, else from the `FileSystemID` tag.
fn record_from_backup(backup: &Backup, parent_hint: Option<&str>) -> BackupRecord {
    let tags = from_fsx_tags(backup.tags());
    let created_at = {
        let t = backup.creation_time();
        DateTime::from_timestamp(t.secs(), t.subsec_nanos()).unwrap_or_else(Utc::now)
    };
    // Transferring/Pending/Copying are still part of creation
    let lifecycle = match backup.lifecycle() {
        FsxBackupLifecycle::Available => RecordLifecycle::Available,
        FsxBackupLifecycle::Failed | FsxBackupLifecycle::Deleted => RecordLifecycle::Failed,
        _ => RecordLifecycle::Creating,
    };
    let parent_resource_id = parent_hint
        .map(str::to_string)
        .or_else(|| {
            tags.iter()
                .find(|t| t.key == TAG_FILE_SYSTEM_ID)
                .map(|t| t.value.clone())
        })
        .unwrap_or_default();

    BackupRecord {
        id: backup.backup_id().to_string(),
        parent_resource_id,
        created_at,
        lifecycle,
        tags,
    }
}

impl BackupStore for FsxClient {
    async fn create_backup(
        &self,
        resource_id: &str,
        tags: Vec<Tag>,
        request_id: &str,
    ) -> Result<BackupRecord, StoreError> {
        let fsx_tags = to_fsx_tags(&tags)?;
        let response = self
            .client
            .create_backup()
            .file_system_id(resource_id)
            .set_tags(Some(fsx_tags))
            .client_request_token(request_id)
            .send()
            .await
            .map_err(|e| store_error(resource_id, e))?;

        let backup = response
            .backup()
            .ok_or_else(|| StoreError::Other(anyhow!("create backup response carried no record")))?;
        Ok(record_from_backup(backup, Some(resource_id)))
    }

    async fn backups_for_resource(
        &self,
        resource_id: &str,
    ) -> Result<Vec<BackupRecord>, StoreError> {
        self.list_backups(
            Filter::builder()
                .name(FilterName::FileSystemId)
                .values(resource_id)
                .build(),
            Some(resource_id),
        )
        .await
    }

    async fn user_initiated_backups(&self) -> Result<Vec<BackupRecord>, StoreError> {
        self.list_backups(
            Filter::builder()
                .name(FilterName::BackupType)
                .values("USER_INITIATED")
                .build(),
            None,
        )
        .await
    }

    async fn delete_backup(&self, backup_id: &str) -> Result<(), StoreError> {
        self.client
            .delete_backup()
            .backup_id(backup_id)
            .send()
            .await
            .map_err(|e| store_error(backup_id, e))?;
        Ok(())
    }
}
