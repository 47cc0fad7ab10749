//! In-memory fakes of the snapkeeper collaborator contracts
//!
//! Each fake records the calls made against it so tests can assert on
//! ordering and idempotency without touching a cloud provider.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use snapkeeper_core::store::{
    AutomationExecutor, AutomationRequest, BackupRecord, BackupStore, ParameterSource,
    RecordLifecycle, SnapshotStore, WorkflowStarter,
};
use snapkeeper_core::tags::TAG_BACKUP_REQUEST_ID;
use snapkeeper_core::{StoreError, Tag};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Build a backup record for tests
pub fn backup_record(
    id: &str,
    parent: &str,
    created_at: DateTime<Utc>,
    lifecycle: RecordLifecycle,
    tags: Vec<Tag>,
) -> BackupRecord {
    BackupRecord {
        id: id.to_string(),
        parent_resource_id: parent.to_string(),
        created_at,
        lifecycle,
        tags,
    }
}

/// In-memory backup store with token-based idempotency
#[derive(Default)]
pub struct FakeBackupStore {
    records: Mutex<Vec<BackupRecord>>,
    deleted: Mutex<Vec<String>>,
    failing_deletes: HashSet<String>,
    throttle_creates: bool,
    create_calls: AtomicU32,
}

impl FakeBackupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records
    pub fn with_records(records: Vec<BackupRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make `delete_backup` fail for the given ids
    pub fn failing_deletes(mut self, ids: &[&str]) -> Self {
        self.failing_deletes = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Make `create_backup` report throttling
    pub fn throttling(mut self) -> Self {
        self.throttle_creates = true;
        self
    }

    /// Ids deleted so far, in deletion order
    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Records currently in the store
    pub fn records(&self) -> Vec<BackupRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of `create_backup` calls observed
    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl BackupStore for FakeBackupStore {
    async fn create_backup(
        &self,
        resource_id: &str,
        tags: Vec<Tag>,
        request_id: &str,
    ) -> Result<BackupRecord, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.throttle_creates {
            return Err(StoreError::Throttled(resource_id.to_string()));
        }

        let mut records = self.records.lock().unwrap();
        // Native idempotency: a record created with this token already exists
        if let Some(existing) = records
            .iter()
            .find(|r| r.tag_value(TAG_BACKUP_REQUEST_ID) == Some(request_id))
        {
            return Ok(existing.clone());
        }

        let record = BackupRecord {
            id: format!("backup-{}", records.len() + 1),
            parent_resource_id: resource_id.to_string(),
            created_at: Utc::now(),
            lifecycle: RecordLifecycle::Creating,
            tags,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn backups_for_resource(
        &self,
        resource_id: &str,
    ) -> Result<Vec<BackupRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.parent_resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn user_initiated_backups(&self) -> Result<Vec<BackupRecord>, StoreError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn delete_backup(&self, backup_id: &str) -> Result<(), StoreError> {
        if self.failing_deletes.contains(backup_id) {
            return Err(StoreError::Other(anyhow!(
                "delete of {backup_id} rejected by store"
            )));
        }
        self.records.lock().unwrap().retain(|r| r.id != backup_id);
        self.deleted.lock().unwrap().push(backup_id.to_string());
        Ok(())
    }
}

/// In-memory snapshot store
#[derive(Default)]
pub struct FakeSnapshotStore {
    records: Mutex<Vec<BackupRecord>>,
    deleted: Mutex<Vec<String>>,
    failing_deletes: HashSet<String>,
}

impl FakeSnapshotStore {
    pub fn with_records(records: Vec<BackupRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make `delete_snapshot` fail for the given ids
    pub fn failing_deletes(mut self, ids: &[&str]) -> Self {
        self.failing_deletes = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Ids deleted so far, in deletion order
    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl SnapshotStore for FakeSnapshotStore {
    async fn snapshots_created_for(
        &self,
        resource_id: &str,
    ) -> Result<Vec<BackupRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.parent_resource_id == resource_id && r.is_self_created())
            .cloned()
            .collect())
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), StoreError> {
        if self.failing_deletes.contains(snapshot_id) {
            return Err(StoreError::Other(anyhow!(
                "delete of {snapshot_id} rejected by store"
            )));
        }
        self.records.lock().unwrap().retain(|r| r.id != snapshot_id);
        self.deleted.lock().unwrap().push(snapshot_id.to_string());
        Ok(())
    }
}

/// Scripted automation executor
#[derive(Default)]
pub struct FakeExecutor {
    started: Mutex<Vec<AutomationRequest>>,
    statuses: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the sequence of native statuses an execution reports.
    /// The last status repeats once the sequence is exhausted.
    pub fn script_statuses(&self, execution_id: &str, statuses: &[&str]) {
        self.statuses.lock().unwrap().insert(
            execution_id.to_string(),
            statuses.iter().rev().map(|s| s.to_string()).collect(),
        );
    }

    /// Automation requests started so far
    pub fn started_requests(&self) -> Vec<AutomationRequest> {
        self.started.lock().unwrap().clone()
    }
}

impl AutomationExecutor for FakeExecutor {
    async fn start_automation(&self, request: &AutomationRequest) -> Result<String, StoreError> {
        let mut started = self.started.lock().unwrap();
        started.push(request.clone());
        Ok(format!("exec-{}", started.len()))
    }

    async fn automation_status(&self, execution_id: &str) -> Result<String, StoreError> {
        let mut statuses = self.statuses.lock().unwrap();
        match statuses.get_mut(execution_id) {
            Some(seq) => {
                if seq.len() > 1 {
                    Ok(seq.pop().unwrap())
                } else {
                    Ok(seq.last().cloned().unwrap_or_else(|| "Pending".to_string()))
                }
            }
            // Not-yet-visible executions report as pending
            None => Ok("Pending".to_string()),
        }
    }
}

/// Parameter source backed by a map
#[derive(Default)]
pub struct FakeParameterSource {
    values: HashMap<String, String>,
}

impl FakeParameterSource {
    pub fn with_parameter(name: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(name.to_string(), value.to_string());
        Self { values }
    }
}

impl ParameterSource for FakeParameterSource {
    async fn resolve_parameter(&self, name: &str) -> Result<String, StoreError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

/// Workflow starter that records every start call
#[derive(Default)]
pub struct FakeWorkflowStarter {
    starts: Mutex<Vec<(String, String)>>,
}

impl FakeWorkflowStarter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(state machine, input)` pairs started so far
    pub fn starts(&self) -> Vec<(String, String)> {
        self.starts.lock().unwrap().clone()
    }
}

impl WorkflowStarter for FakeWorkflowStarter {
    async fn start_workflow(&self, state_machine: &str, input: String) -> Result<String, StoreError> {
        let mut starts = self.starts.lock().unwrap();
        starts.push((state_machine.to_string(), input));
        Ok(format!("workflow-run-{}", starts.len()))
    }
}
