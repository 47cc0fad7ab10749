//! Store and lifecycle error taxonomies
//!
//! `StoreError` is what collaborating stores and executors report;
//! `LifecycleError` is what a lifecycle step surfaces to the orchestrator,
//! with enough context (resource id, operation handle, attempt count) that
//! the orchestrator's records stay traceable.

use crate::event::SnapshotEvent;
use thiserror::Error;

/// Classified failure from a collaborating store or executor
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced object no longer exists
    #[error("{0} not found")]
    NotFound(String),

    /// Provider rate limiting; the call may be retried with the same
    /// idempotency token
    #[error("request for {0} throttled by the provider")]
    Throttled(String),

    /// Any other provider failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if this is a throttling error
    pub fn is_throttled(&self) -> bool {
        matches!(self, StoreError::Throttled(_))
    }
}

/// Fatal lifecycle failures surfaced to the orchestrator
///
/// A failure for one resource never aborts sibling lifecycles; the
/// orchestrator records it and moves on.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The resource (or a named parameter) vanished; fatal for this
    /// resource's lifecycle
    #[error("resource {resource_id} not found (attempt {attempt_count})")]
    NotFound {
        resource_id: String,
        attempt_count: u32,
    },

    /// Provider rate limiting; the orchestrator retries the step with the
    /// same idempotency token
    #[error("request for {resource_id} throttled (attempt {attempt_count}); retry with token {request_id}")]
    Throttled {
        resource_id: String,
        request_id: String,
        attempt_count: u32,
    },

    /// The automation execution reached a terminal failed state; recorded,
    /// not retried
    #[error("execution {execution_id} for {resource_id} failed (attempt {attempt_count})")]
    OperationFailed {
        resource_id: String,
        execution_id: String,
        attempt_count: u32,
    },

    /// The event carries no operation handle to poll
    #[error("event for {resource_id} has no execution to poll (attempt {attempt_count})")]
    MissingOperationHandle {
        resource_id: String,
        attempt_count: u32,
    },

    /// Any other provider failure
    #[error("provider call for {resource_id} failed (attempt {attempt_count}): {source}")]
    Provider {
        resource_id: String,
        attempt_count: u32,
        #[source]
        source: anyhow::Error,
    },
}

impl LifecycleError {
    /// Lift a store failure into the lifecycle taxonomy, attaching the
    /// event's resource id, request token, and attempt count.
    pub fn from_store(err: StoreError, event: &SnapshotEvent) -> Self {
        let resource_id = event.resource.id.clone();
        let attempt_count = event.attempt_count;
        match err {
            StoreError::NotFound(_) => Self::NotFound {
                resource_id,
                attempt_count,
            },
            StoreError::Throttled(_) => Self::Throttled {
                resource_id,
                request_id: event.request_id.clone().unwrap_or_default(),
                attempt_count,
            },
            StoreError::Other(source) => Self::Provider {
                resource_id,
                attempt_count,
                source,
            },
        }
    }

    /// Check if this failure is retryable with the same token
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }
}
