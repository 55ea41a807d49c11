//! tf-runner entry point
//!
//! Single-shot: parse configuration, run the lifecycle once, publish
//! outputs, translate any error into a non-zero exit code.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tf_runner::cache::BinaryCache;
use tf_runner::config::RunConfig;
use tf_runner::error::{RunnerError, RunnerResult};
use tf_runner::install::ReleaseInstaller;
use tf_runner::publish::{publish_outputs, KubeSecretStore};
use tf_runner::runner::TerraformJob;
use tf_runner::terraform::TerraformCli;
use tf_runner::vars::discover_var_files;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            if e.infrastructure_mutated() {
                eprintln!(
                    "{} infrastructure was already modified; fix the secret and re-publish instead of re-applying",
                    style("Note:").yellow()
                );
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    // RUST_LOG wins; LOG_LEVEL keeps parity with older deployments
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match std::env::var("LOG_LEVEL") {
            Ok(level) => EnvFilter::new(format!("tf_runner={level}")),
            Err(_) => EnvFilter::new("tf_runner=info"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run() -> RunnerResult<()> {
    let config = RunConfig::parse();
    init_tracing();
    config.validate()?;

    // Fail on a bad cluster config before anything mutates
    let kube_client = kube::Client::try_default()
        .await
        .map_err(|e| RunnerError::KubeClient(e.to_string()))?;

    let cache = BinaryCache::new(&config.cache_dir);
    let installer = ReleaseInstaller::new();
    let binary = cache
        .ensure(&config.terraform_version, &installer)
        .await?;

    let var_files = discover_var_files(&config.var_files_dir)?;

    let backend = TerraformCli::new(binary.path.clone(), config.project_dir.clone());
    let job = TerraformJob::new(backend, var_files, config.workspace.clone(), config.destroy);

    let outputs = job.execute().await?;

    let store = KubeSecretStore::new(kube_client, &config.namespace, &config.output_secret);
    if publish_outputs(&store, &outputs).await? {
        info!(secret = %config.output_secret, "secret was updated with outputs");
    }

    info!("run finished successfully");
    Ok(())
}
