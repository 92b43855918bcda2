use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::RequestId;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use chrono::Utc;
use lambda_watch_core::InvocationRequest;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("failed to invoke {function_name}: {message}")]
    Rejected {
        function_name: String,
        message: String,
    },
    #[error("invoke of {function_name} was accepted without a request id")]
    MissingRequestId { function_name: String },
}

/// Issues one asynchronous invocation and reports what the log correlation
/// engine needs to follow it.
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: &[u8],
    ) -> Result<InvocationRequest, InvokeError>;
}

#[derive(Debug, Clone)]
pub struct AwsLambdaInvoker {
    lambda_client: aws_sdk_lambda::Client,
}

impl AwsLambdaInvoker {
    pub fn new(lambda_client: aws_sdk_lambda::Client) -> Self {
        Self { lambda_client }
    }
}

#[async_trait]
impl FunctionInvoker for AwsLambdaInvoker {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: &[u8],
    ) -> Result<InvocationRequest, InvokeError> {
        let start_time = Utc::now().timestamp_millis();
        info!(function_name, "invoking_function");

        let output = self
            .lambda_client
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload.to_vec()))
            .send()
            .await
            .map_err(|error| InvokeError::Rejected {
                function_name: function_name.to_string(),
                message: DisplayErrorContext(&error).to_string(),
            })?;

        let request_id = output
            .request_id()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InvokeError::MissingRequestId {
                function_name: function_name.to_string(),
            })?;

        Ok(InvocationRequest {
            function_name: function_name.to_string(),
            request_id: request_id.to_string(),
            start_time,
        })
    }
}
