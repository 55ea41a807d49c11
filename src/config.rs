//! Run configuration
//!
//! One immutable configuration value per run, parsed from flags or the
//! environment variables the job container is started with, validated once
//! at startup. Nothing re-derives configuration mid-run.

use crate::error::{RunnerError, RunnerResult};
use clap::Parser;
use std::path::PathBuf;

/// Configuration for a single batch run
#[derive(Parser, Debug, Clone)]
#[command(name = "tf-runner")]
#[command(author, version, about, long_about = None)]
pub struct RunConfig {
    /// Terraform version to install and run (exact pin, e.g. "1.5.0")
    #[arg(long, env = "TERRAFORM_VERSION")]
    pub terraform_version: String,

    /// Workspace to select before planning (empty = stay on current)
    #[arg(long, env = "TERRAFORM_WORKSPACE", default_value = "")]
    pub workspace: String,

    /// Destroy the project instead of applying it
    #[arg(
        long,
        env = "TERRAFORM_DESTROY",
        default_value_t = false,
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub destroy: bool,

    /// Shared cache directory holding pinned terraform binaries
    #[arg(long, env = "TF_PLUGIN_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Directory containing the terraform project
    #[arg(long, env = "TERRAFORM_PROJECT_PATH", default_value = "/tmp/tf-project")]
    pub project_dir: PathBuf,

    /// Directory tree searched for variable files
    #[arg(long, env = "TERRAFORM_VAR_FILES_PATH", default_value = "/tmp/tf-vars")]
    pub var_files_dir: PathBuf,

    /// Namespace of the output secret
    #[arg(long, env = "POD_NAMESPACE")]
    pub namespace: String,

    /// Name of the pre-existing secret receiving module outputs
    #[arg(long, env = "OUTPUT_SECRET_NAME")]
    pub output_secret: String,
}

impl RunConfig {
    /// Validate the configuration before any lifecycle step starts
    pub fn validate(&self) -> RunnerResult<()> {
        semver::Version::parse(&self.terraform_version).map_err(|e| {
            RunnerError::ConfigInvalid {
                reason: format!(
                    "terraform version '{}' is not a valid version: {e}",
                    self.terraform_version
                ),
            }
        })?;

        if self.cache_dir.as_os_str().is_empty() {
            return Err(RunnerError::ConfigInvalid {
                reason: "cache directory must not be empty".to_string(),
            });
        }

        if self.namespace.is_empty() {
            return Err(RunnerError::ConfigInvalid {
                reason: "output secret namespace must not be empty".to_string(),
            });
        }

        if self.output_secret.is_empty() {
            return Err(RunnerError::ConfigInvalid {
                reason: "output secret name must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
