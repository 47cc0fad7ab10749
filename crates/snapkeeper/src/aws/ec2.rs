//! EC2 instance discovery and snapshot store access

use super::context::AwsContext;
use super::error::store_error;
use anyhow::{Context, Result};
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter, Snapshot, SnapshotState, Tag as Ec2Tag};
use chrono::{DateTime, Utc};
use snapkeeper_core::store::{BackupRecord, RecordLifecycle, SnapshotStore};
use snapkeeper_core::tags::{TAG_CREATED_BY, TAG_CREATED_BY_VALUE, TAG_INSTANCE_ID};
use snapkeeper_core::{ResourceKind, ResourceRef, StoreError, Tag};
use tracing::debug;

/// EC2 client for instance discovery and snapshot cleanup
pub struct Ec2Client {
    client: Client,
}

impl Ec2Client {
    /// Create a new EC2 client
    pub fn new(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }

    /// Discover running instances carrying the given tag pair (paginated)
    pub async fn discover_tagged_instances(
        &self,
        tag_key: &str,
        tag_value: &str,
    ) -> Result<Vec<ResourceRef>> {
        let mut resources = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_instances()
                .filters(
                    Filter::builder()
                        .name(format!("tag:{tag_key}"))
                        .values(tag_value)
                        .build(),
                )
                .filters(
                    Filter::builder()
                        .name("instance-state-name")
                        .values("running")
                        .build(),
                )
                .set_next_token(next_token.clone())
                .send()
                .await
                .context("Failed to describe instances")?;

            for reservation in response.reservations() {
                for instance in reservation.instances() {
                    if let Some(instance_id) = instance.instance_id() {
                        resources.push(ResourceRef::new(
                            instance_id,
                            ResourceKind::Instance,
                            from_ec2_tags(instance.tags()),
                        ));
                    }
                }
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!(count = resources.len(), "Found tagged instances");
        Ok(resources)
    }
}

fn from_ec2_tags(tags: &[Ec2Tag]) -> Vec<Tag> {
    tags.iter()
        .filter_map(|t| match (t.key(), t.value()) {
            (Some(k), Some(v)) => Some(Tag::new(k, v)),
            _ => None,
        })
        .collect()
}

fn record_from_snapshot(snapshot: &Snapshot, resource_id: &str) -> Option<BackupRecord> {
    let id = snapshot.snapshot_id()?.to_string();
    let created_at = snapshot
        .start_time()
        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_else(Utc::now);
    let lifecycle = match snapshot.state() {
        Some(SnapshotState::Completed) => RecordLifecycle::Available,
        Some(SnapshotState::Error) => RecordLifecycle::Failed,
        _ => RecordLifecycle::Creating,
    };

    Some(BackupRecord {
        id,
        parent_resource_id: resource_id.to_string(),
        created_at,
        lifecycle,
        tags: from_ec2_tags(snapshot.tags()),
    })
}

impl SnapshotStore for Ec2Client {
    async fn snapshots_created_for(
        &self,
        resource_id: &str,
    ) -> Result<Vec<BackupRecord>, StoreError> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_snapshots()
                .filters(
                    Filter::builder()
                        .name(format!("tag:{TAG_INSTANCE_ID}"))
                        .values(resource_id)
                        .build(),
                )
                .filters(
                    Filter::builder()
                        .name(format!("tag:{TAG_CREATED_BY}"))
                        .values(TAG_CREATED_BY_VALUE)
                        .build(),
                )
                .set_next_token(next_token.clone())
                .send()
                .await
                .map_err(|e| store_error(resource_id, e))?;

            for snapshot in response.snapshots() {
                if let Some(record) = record_from_snapshot(snapshot, resource_id) {
                    records.push(record);
                }
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        debug!(
            instance_id = %resource_id,
            count = records.len(),
            "Found snapshots created for instance"
        );
        Ok(records)
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), StoreError> {
        self.client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .send()
            .await
            .map_err(|e| store_error(snapshot_id, e))?;
        Ok(())
    }
}
