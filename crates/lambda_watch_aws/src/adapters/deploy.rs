use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_lambda::client::Waiters;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime};
use thiserror::Error;
use tracing::info;

use crate::function_config::FunctionConfig;

const UPDATE_WAIT_LIMIT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to {action} {function_name}: {message}")]
pub struct UploadError {
    pub function_name: String,
    pub action: &'static str,
    pub message: String,
}

/// Pushes a packaged archive to the function platform.
#[async_trait]
pub trait FunctionUploader: Send + Sync {
    async fn upload_function(
        &self,
        config: &FunctionConfig,
        archive: Vec<u8>,
    ) -> Result<UploadOutcome, UploadError>;
}

#[derive(Debug, Clone)]
pub struct AwsLambdaUploader {
    lambda_client: aws_sdk_lambda::Client,
}

impl AwsLambdaUploader {
    pub fn new(lambda_client: aws_sdk_lambda::Client) -> Self {
        Self { lambda_client }
    }

    async fn function_exists(&self, function_name: &str) -> Result<bool, UploadError> {
        match self
            .lambda_client
            .get_function()
            .function_name(function_name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(error) => Err(upload_error(function_name, "look up", &error)),
        }
    }

    async fn create(&self, config: &FunctionConfig, archive: Vec<u8>) -> Result<(), UploadError> {
        self.lambda_client
            .create_function()
            .function_name(&config.function_name)
            .role(&config.role)
            .handler(&config.handler)
            .runtime(Runtime::from(config.runtime.as_str()))
            .code(FunctionCode::builder().zip_file(Blob::new(archive)).build())
            .set_timeout(config.timeout)
            .set_memory_size(config.memory_size)
            .set_description(config.description.clone())
            .send()
            .await
            .map(|_| ())
            .map_err(|error| upload_error(&config.function_name, "create", &error))
    }

    async fn update(&self, config: &FunctionConfig, archive: Vec<u8>) -> Result<(), UploadError> {
        self.lambda_client
            .update_function_code()
            .function_name(&config.function_name)
            .zip_file(Blob::new(archive))
            .send()
            .await
            .map_err(|error| upload_error(&config.function_name, "update code of", &error))?;

        // A configuration update is rejected while the code update is in progress.
        self.lambda_client
            .wait_until_function_updated()
            .function_name(&config.function_name)
            .wait(UPDATE_WAIT_LIMIT)
            .await
            .map_err(|error| upload_error(&config.function_name, "wait for", &error))?;

        self.lambda_client
            .update_function_configuration()
            .function_name(&config.function_name)
            .role(&config.role)
            .handler(&config.handler)
            .runtime(Runtime::from(config.runtime.as_str()))
            .set_timeout(config.timeout)
            .set_memory_size(config.memory_size)
            .set_description(config.description.clone())
            .send()
            .await
            .map(|_| ())
            .map_err(|error| upload_error(&config.function_name, "update configuration of", &error))
    }
}

#[async_trait]
impl FunctionUploader for AwsLambdaUploader {
    async fn upload_function(
        &self,
        config: &FunctionConfig,
        archive: Vec<u8>,
    ) -> Result<UploadOutcome, UploadError> {
        if self.function_exists(&config.function_name).await? {
            info!(function_name = %config.function_name, "updating_function");
            self.update(config, archive).await?;
            Ok(UploadOutcome::Updated)
        } else {
            info!(function_name = %config.function_name, "creating_function");
            self.create(config, archive).await?;
            Ok(UploadOutcome::Created)
        }
    }
}

fn upload_error<E>(function_name: &str, action: &'static str, error: &E) -> UploadError
where
    E: std::error::Error + 'static,
{
    UploadError {
        function_name: function_name.to_string(),
        action,
        message: DisplayErrorContext(error).to_string(),
    }
}
