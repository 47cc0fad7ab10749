//! Workflow trigger over discovered resources
//!
//! Discovery hands in the tagged instances and file systems; this module
//! builds the workflow input payload and starts the workflow. Finding nothing
//! is a no-op outcome, not a failure.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snapkeeper_core::store::WorkflowStarter;
use snapkeeper_core::{ResourceRef, SnapshotEvent};
use tracing::info;

/// Input payload handed to the workflow: one event per discovered resource
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkflowInput {
    #[serde(rename = "Instances")]
    pub instances: Vec<SnapshotEvent>,
    #[serde(rename = "FileSystems")]
    pub file_systems: Vec<SnapshotEvent>,
}

/// Start the backup workflow over the discovered resources.
///
/// Returns `Ok(None)` without starting anything when discovery found no
/// resources of either kind.
pub async fn trigger_workflow(
    starter: &impl WorkflowStarter,
    state_machine_arn: &str,
    instances: Vec<ResourceRef>,
    file_systems: Vec<ResourceRef>,
) -> Result<Option<String>> {
    if instances.is_empty() && file_systems.is_empty() {
        info!("No tagged resources found, nothing to snapshot");
        return Ok(None);
    }

    info!(
        instances = instances.len(),
        file_systems = file_systems.len(),
        "Starting backup workflow over discovered resources"
    );

    let input = WorkflowInput {
        instances: instances.into_iter().map(SnapshotEvent::new).collect(),
        file_systems: file_systems.into_iter().map(SnapshotEvent::new).collect(),
    };
    let payload = serde_json::to_string(&input).context("Failed to serialize workflow input")?;

    let execution = starter
        .start_workflow(state_machine_arn, payload)
        .await
        .context("Failed to start backup workflow")?;
    Ok(Some(execution))
}
