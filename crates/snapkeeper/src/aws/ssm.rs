//! Systems Manager access: parameter resolution and automation executions

use super::context::AwsContext;
use super::error::store_error;
use anyhow::anyhow;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::types::{AutomationExecutionFilter, AutomationExecutionFilterKey};
use snapkeeper_core::StoreError;
use snapkeeper_core::store::{AutomationExecutor, AutomationRequest, ParameterSource};
use tracing::debug;

/// SSM client for parameter lookup and automation execution
pub struct SsmClient {
    client: Client,
}

impl SsmClient {
    /// Create a new SSM client
    pub fn new(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ssm_client(),
        }
    }
}

impl ParameterSource for SsmClient {
    async fn resolve_parameter(&self, name: &str) -> Result<String, StoreError> {
        let response = self
            .client
            .get_parameter()
            .name(name)
            .send()
            .await
            .map_err(|e| store_error(name, e))?;

        response
            .parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

impl AutomationExecutor for SsmClient {
    async fn start_automation(&self, request: &AutomationRequest) -> Result<String, StoreError> {
        let response = self
            .client
            .start_automation_execution()
            .document_name(&request.document)
            .parameters("InstanceId", vec![request.instance_id.clone()])
            .parameters("SnapshotName", vec![request.snapshot_name.clone()])
            .parameters("SnapshotRequestId", vec![request.request_id.clone()])
            .client_token(&request.request_id)
            .send()
            .await
            .map_err(|e| store_error(&request.instance_id, e))?;

        response
            .automation_execution_id()
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::Other(anyhow!("automation start response carried no execution id"))
            })
    }

    async fn automation_status(&self, execution_id: &str) -> Result<String, StoreError> {
        let filter = AutomationExecutionFilter::builder()
            .key(AutomationExecutionFilterKey::ExecutionId)
            .values(execution_id)
            .build()
            .map_err(|e| StoreError::Other(anyhow::Error::new(e)))?;

        let response = self
            .client
            .describe_automation_executions()
            .filters(filter)
            .send()
            .await
            .map_err(|e| store_error(execution_id, e))?;

        // Freshly started executions can lag visibility; report them as
        // pending rather than erroring.
        let native = response
            .automation_execution_metadata_list()
            .first()
            .and_then(|m| m.automation_execution_status())
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "Pending".to_string());

        debug!(execution_id = %execution_id, native = %native, "Automation execution status");
        Ok(native)
    }
}
