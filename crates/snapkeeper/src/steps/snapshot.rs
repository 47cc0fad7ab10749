//! Instance snapshot request and execution polling

use snapkeeper_core::store::{AutomationExecutor, AutomationRequest, ParameterSource};
use snapkeeper_core::{ExecutionStatus, LifecycleError, SnapshotEvent};
use tracing::{info, warn};

/// Request a point-in-time snapshot of an instance.
///
/// Bumps the attempt counter, derives the attempt's idempotency token,
/// resolves the automation document through the parameter store, and starts
/// the execution. The snapshot label is the resource's `Name` tag if present,
/// else its id.
pub async fn request_instance_snapshot(
    executor: &impl AutomationExecutor,
    parameters: &impl ParameterSource,
    document_parameter: &str,
    mut event: SnapshotEvent,
) -> Result<SnapshotEvent, LifecycleError> {
    let request_id = event.begin_attempt();
    info!(
        instance_id = %event.resource.id,
        attempt = event.attempt_count,
        "Requesting instance snapshot"
    );

    let document = parameters
        .resolve_parameter(document_parameter)
        .await
        .map_err(|e| LifecycleError::from_store(e, &event))?;

    let request = AutomationRequest {
        document,
        instance_id: event.resource.id.clone(),
        snapshot_name: event.resource.display_name().to_string(),
        request_id,
    };
    let execution_id = executor
        .start_automation(&request)
        .await
        .map_err(|e| LifecycleError::from_store(e, &event))?;

    info!(
        instance_id = %event.resource.id,
        execution_id = %execution_id,
        "Automation execution started"
    );
    event.execution_id = Some(execution_id);
    event.status = ExecutionStatus::InProgress;
    Ok(event)
}

/// Poll the automation execution backing an event.
///
/// Reads the native status, normalizes it onto the event, and counts the
/// poll as an attempt when the execution is still pending so the caller can
/// bound its waits. Never sleeps; the caller decides when to poll again.
pub async fn poll_execution(
    executor: &impl AutomationExecutor,
    mut event: SnapshotEvent,
) -> Result<SnapshotEvent, LifecycleError> {
    let execution_id =
        event
            .execution_id
            .clone()
            .ok_or_else(|| LifecycleError::MissingOperationHandle {
                resource_id: event.resource.id.clone(),
                attempt_count: event.attempt_count,
            })?;

    let native = executor
        .automation_status(&execution_id)
        .await
        .map_err(|e| LifecycleError::from_store(e, &event))?;

    let status = ExecutionStatus::from_native(&native);
    info!(
        execution_id = %execution_id,
        native = %native,
        status = %status,
        "Polled automation execution"
    );

    event.status = status;
    if !status.is_terminal() {
        event.record_pending();
    }
    if let Some(failure) = event.failure() {
        warn!(error = %failure, "Automation execution failed");
    }
    Ok(event)
}
