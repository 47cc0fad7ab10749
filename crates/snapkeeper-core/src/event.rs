//! Snapshot lifecycle event payload
//!
//! A `SnapshotEvent` is the unit of work the orchestrator passes between
//! lifecycle steps. The system keeps no state of its own; everything a step
//! needs travels in the event and everything it learned travels back out.
//! Field names serialize PascalCase so payloads stay legible inside the
//! workflow engine that shuttles them.

use crate::error::LifecycleError;
use crate::resource::ResourceRef;
use crate::status::ExecutionStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deterministic request-token derivation
const REQUEST_TOKEN_NAMESPACE: Uuid = Uuid::from_u128(0x8f2f_41d6_9c3a_4b7e_a1d5_0c6b_2e84_93f7);

/// Lifecycle state for one resource, passed between orchestrator steps
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotEvent {
    /// The resource this lifecycle runs against
    #[serde(flatten)]
    pub resource: ResourceRef,
    /// How many times a request or pending poll has run for this resource.
    /// Never decreases; the orchestrator bounds its waits with it.
    pub attempt_count: u32,
    /// Idempotency token for the current attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Normalized outcome of the automation execution, if any
    #[serde(default)]
    pub status: ExecutionStatus,
    /// Handle of the automation execution backing this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    /// Whether any backup for the resource is still being created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_in_progress: Option<bool>,
    /// Id of the backup created for this event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    /// Name-tag value of the resource, recorded once a backup is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

impl SnapshotEvent {
    /// Create an event for a freshly discovered resource
    pub fn new(resource: ResourceRef) -> Self {
        Self {
            resource,
            attempt_count: 0,
            request_id: None,
            status: ExecutionStatus::Unknown,
            execution_id: None,
            backup_in_progress: None,
            backup_id: None,
            resource_name: None,
        }
    }

    /// Begin a request attempt: bump the counter and derive this attempt's
    /// idempotency token.
    ///
    /// The token is a function of `(resource id, attempt count)`, so an
    /// orchestrator retry that re-enters the step with the same input event
    /// reproduces the same token and cannot create a second backup.
    pub fn begin_attempt(&mut self) -> String {
        self.attempt_count += 1;
        let token = derive_request_token(&self.resource.id, self.attempt_count);
        self.request_id = Some(token.clone());
        token
    }

    /// Record a poll that found work still pending
    pub fn record_pending(&mut self) {
        self.attempt_count += 1;
    }

    /// Check if the execution backing this event reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The recorded failure for this event, if its execution failed.
    ///
    /// Carries the resource id, operation handle, and attempt count so the
    /// orchestrator's failure records stay traceable.
    pub fn failure(&self) -> Option<LifecycleError> {
        if self.status.is_failure() {
            Some(LifecycleError::OperationFailed {
                resource_id: self.resource.id.clone(),
                execution_id: self.execution_id.clone().unwrap_or_default(),
                attempt_count: self.attempt_count,
            })
        } else {
            None
        }
    }
}

/// Deterministic idempotency token for one attempt against one resource
pub fn derive_request_token(resource_id: &str, attempt: u32) -> String {
    Uuid::new_v5(
        &REQUEST_TOKEN_NAMESPACE,
        format!("{resource_id}/{attempt}").as_bytes(),
    )
    .to_string()
}
