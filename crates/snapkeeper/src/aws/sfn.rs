//! Step Functions access for starting the backup workflow

use super::context::AwsContext;
use super::error::store_error;
use aws_sdk_sfn::Client;
use snapkeeper_core::StoreError;
use snapkeeper_core::store::WorkflowStarter;
use tracing::info;

/// Step Functions client for starting workflow executions
pub struct SfnClient {
    client: Client,
}

impl SfnClient {
    /// Create a new Step Functions client
    pub fn new(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.sfn_client(),
        }
    }
}

impl WorkflowStarter for SfnClient {
    async fn start_workflow(
        &self,
        state_machine: &str,
        input: String,
    ) -> Result<String, StoreError> {
        let response = self
            .client
            .start_execution()
            .state_machine_arn(state_machine)
            .input(input)
            .send()
            .await
            .map_err(|e| store_error(state_machine, e))?;

        let execution_arn = response.execution_arn().to_string();
        info!(execution = %execution_arn, "Workflow execution started");
        Ok(execution_arn)
    }
}
