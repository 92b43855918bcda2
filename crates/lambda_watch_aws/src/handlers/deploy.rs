//! The `deploy` flow: discover, package and upload matching functions.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::adapters::deploy::{FunctionUploader, UploadOutcome};
use crate::function_config::load_function_config;
use crate::packaging::{discover_functions, package_function};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedFunction {
    pub function_name: String,
    pub archive_path: PathBuf,
    pub outcome: UploadOutcome,
}

/// Functions are processed one at a time; the first failure stops the run.
pub async fn deploy_functions<U: FunctionUploader + ?Sized>(
    uploader: &U,
    source_path: &Path,
    deploy_path: &Path,
    filter: &str,
) -> anyhow::Result<Vec<DeployedFunction>> {
    info!(
        filter,
        source_path = %source_path.display(),
        deploy_path = %deploy_path.display(),
        "deployment_started"
    );

    let functions = discover_functions(source_path, deploy_path, filter)?;
    let mut deployed = Vec::with_capacity(functions.len());

    for details in functions {
        let config = load_function_config(&details.config_path)?;
        let archive = package_function(&details)?;
        let archive_bytes = archive.len();

        let outcome = uploader
            .upload_function(&config, archive)
            .await
            .with_context(|| format!("deployment of {} failed", details.source_path.display()))?;
        info!(
            function_name = %config.function_name,
            archive = %details.archive_path.display(),
            archive_bytes,
            outcome = ?outcome,
            "function_deployed"
        );

        deployed.push(DeployedFunction {
            function_name: config.function_name,
            archive_path: details.archive_path,
            outcome,
        });
    }

    info!(count = deployed.len(), "deployment_completed");
    Ok(deployed)
}
