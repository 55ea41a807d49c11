//! Execution lifecycle
//!
//! Drives one batch run against an already-installed binary: init,
//! optional workspace switch, plan, then exactly one of apply or destroy,
//! then output collection. Steps run strictly in order and the first
//! failure aborts everything that follows.

use crate::error::RunnerResult;
use crate::terraform::backend::TerraformBackend;
use crate::terraform::options::{
    ApplyOptions, DestroyOptions, InitOptions, OutputSet, PlanOptions, PlanResult,
    PLAN_ARTIFACT_PATH,
};
use std::path::PathBuf;
use tracing::info;

/// One batch run of the terraform lifecycle
pub struct TerraformJob<B> {
    backend: B,
    var_files: Vec<PathBuf>,
    workspace: String,
    destroy: bool,
}

impl<B: TerraformBackend> TerraformJob<B> {
    /// Bind a backend to the run's var files, workspace and action
    pub fn new(
        backend: B,
        var_files: Vec<PathBuf>,
        workspace: impl Into<String>,
        destroy: bool,
    ) -> Self {
        Self {
            backend,
            var_files,
            workspace: workspace.into(),
            destroy,
        }
    }

    /// Run the whole lifecycle and return the collected outputs
    pub async fn execute(&self) -> RunnerResult<OutputSet> {
        self.init().await?;
        self.select_workspace().await?;

        let plan = self.plan().await?;
        if plan.has_diff {
            info!("plan detected some changes");
        }

        // The destroy flag alone decides the action; the plan result is
        // informational.
        if self.destroy {
            self.destroy_project().await?;
        } else {
            self.apply().await?;
        }

        self.collect_outputs().await
    }

    async fn init(&self) -> RunnerResult<()> {
        info!("initializing terraform module");
        self.backend.init(&InitOptions { upgrade: true }).await
    }

    /// Switch to the configured workspace. No-op when none is configured
    /// or the desired workspace is already current; otherwise one select
    /// or one create, never both.
    async fn select_workspace(&self) -> RunnerResult<()> {
        if self.workspace.is_empty() {
            return Ok(());
        }

        info!(workspace = %self.workspace, "selecting workspace");

        let list = self.backend.workspace_list().await?;
        if list.current == self.workspace {
            return Ok(());
        }

        if list.names.iter().any(|name| name == &self.workspace) {
            self.backend.workspace_select(&self.workspace).await
        } else {
            self.backend.workspace_new(&self.workspace).await
        }
    }

    async fn plan(&self) -> RunnerResult<PlanResult> {
        info!("running terraform plan");
        let opts = PlanOptions {
            var_files: self.var_files.clone(),
            out_path: PathBuf::from(PLAN_ARTIFACT_PATH),
        };
        let has_diff = self.backend.plan(&opts).await?;
        Ok(PlanResult { has_diff })
    }

    async fn apply(&self) -> RunnerResult<()> {
        info!("running terraform apply");
        let opts = ApplyOptions {
            var_files: self.var_files.clone(),
        };
        self.backend.apply(&opts).await
    }

    async fn destroy_project(&self) -> RunnerResult<()> {
        info!("running terraform destroy");
        let opts = DestroyOptions {
            var_files: self.var_files.clone(),
        };
        self.backend.destroy(&opts).await
    }

    async fn collect_outputs(&self) -> RunnerResult<OutputSet> {
        info!("retrieving outputs for module");
        self.backend.output().await
    }
}
