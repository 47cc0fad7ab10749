//! Contracts for the stores and executors the lifecycle drives
//!
//! Lifecycle steps are written against these traits and receive concrete
//! clients (or in-memory fakes) from the caller. The records they trade in
//! are owned by the external store; this system only reads and deletes them.

use crate::error::StoreError;
use crate::resource::Tag;
use crate::tags::{TAG_CREATED_BY, TAG_CREATED_BY_VALUE, has_tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state the store reports for a snapshot or backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordLifecycle {
    /// Still being created; not yet usable
    Creating,
    /// Complete and restorable
    Available,
    /// Creation failed
    Failed,
}

impl RecordLifecycle {
    /// Check if the record is still being created
    pub fn is_creating(self) -> bool {
        matches!(self, Self::Creating)
    }
}

/// A snapshot/backup record as read from the collaborating store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BackupRecord {
    /// Store-assigned record id
    pub id: String,
    /// Resource the record was taken from
    pub parent_resource_id: String,
    /// When the store created the record
    pub created_at: DateTime<Utc>,
    /// Store-reported lifecycle state
    pub lifecycle: RecordLifecycle,
    /// Tags on the record
    pub tags: Vec<Tag>,
}

impl BackupRecord {
    /// Check whether this record carries snapkeeper's provenance tag
    pub fn is_self_created(&self) -> bool {
        has_tag(&self.tags, TAG_CREATED_BY, TAG_CREATED_BY_VALUE)
    }

    /// Look up a tag value by key
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// Parameters for one run of the snapshot automation document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationRequest {
    /// Automation document to run
    pub document: String,
    /// Instance to snapshot
    pub instance_id: String,
    /// Human-readable label for the created snapshot
    pub snapshot_name: String,
    /// Idempotency token for this attempt
    pub request_id: String,
}

/// Backup store for file-system style backups: create, describe, delete
pub trait BackupStore {
    /// Create a backup of the resource. Repeated calls with the same request
    /// token must not create a second backup.
    fn create_backup(
        &self,
        resource_id: &str,
        tags: Vec<Tag>,
        request_id: &str,
    ) -> impl Future<Output = Result<BackupRecord, StoreError>>;

    /// All backups recorded for the resource, regardless of who created them
    fn backups_for_resource(
        &self,
        resource_id: &str,
    ) -> impl Future<Output = Result<Vec<BackupRecord>, StoreError>>;

    /// All user-initiated backups visible to the caller
    fn user_initiated_backups(&self)
    -> impl Future<Output = Result<Vec<BackupRecord>, StoreError>>;

    /// Delete a backup by id
    fn delete_backup(&self, backup_id: &str) -> impl Future<Output = Result<(), StoreError>>;
}

/// Store of point-in-time snapshots taken of compute instances
pub trait SnapshotStore {
    /// Snapshots this tool created for the instance
    fn snapshots_created_for(
        &self,
        resource_id: &str,
    ) -> impl Future<Output = Result<Vec<BackupRecord>, StoreError>>;

    /// Delete a snapshot by id
    fn delete_snapshot(&self, snapshot_id: &str) -> impl Future<Output = Result<(), StoreError>>;
}

/// Automation executor running the snapshot document
pub trait AutomationExecutor {
    /// Start the automation document; returns the execution id
    fn start_automation(
        &self,
        request: &AutomationRequest,
    ) -> impl Future<Output = Result<String, StoreError>>;

    /// Provider-native status of an execution. Executions not yet visible
    /// report a pending status rather than an error.
    fn automation_status(
        &self,
        execution_id: &str,
    ) -> impl Future<Output = Result<String, StoreError>>;
}

/// Named configuration values resolved at call time
pub trait ParameterSource {
    /// Resolve a parameter by name
    fn resolve_parameter(&self, name: &str) -> impl Future<Output = Result<String, StoreError>>;
}

/// The workflow orchestrator's entry point
pub trait WorkflowStarter {
    /// Start a workflow execution with a JSON input payload
    fn start_workflow(
        &self,
        state_machine: &str,
        input: String,
    ) -> impl Future<Output = Result<String, StoreError>>;
}
