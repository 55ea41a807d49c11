//! Seam over the external terraform binary
//!
//! The lifecycle orchestrator only talks to this trait; the real
//! implementation shells out to the cached binary, tests substitute a
//! recording mock.

use crate::error::RunnerResult;
use crate::terraform::options::{ApplyOptions, DestroyOptions, InitOptions, OutputSet, PlanOptions};
use async_trait::async_trait;

/// Workspace listing: every known workspace plus the currently selected one
#[derive(Debug, Clone)]
pub struct WorkspaceList {
    pub names: Vec<String>,
    pub current: String,
}

/// Operations the orchestrator needs from the external tool
#[async_trait]
pub trait TerraformBackend: Send + Sync {
    /// Initialize the project's modules and providers
    async fn init(&self, opts: &InitOptions) -> RunnerResult<()>;

    /// List workspaces and the current one
    async fn workspace_list(&self) -> RunnerResult<WorkspaceList>;

    /// Switch to an existing workspace
    async fn workspace_select(&self, name: &str) -> RunnerResult<()>;

    /// Create a workspace; it becomes current
    async fn workspace_new(&self, name: &str) -> RunnerResult<()>;

    /// Plan the project; returns whether a diff was detected
    async fn plan(&self, opts: &PlanOptions) -> RunnerResult<bool>;

    /// Apply the project
    async fn apply(&self, opts: &ApplyOptions) -> RunnerResult<()>;

    /// Destroy the project
    async fn destroy(&self, opts: &DestroyOptions) -> RunnerResult<()>;

    /// Collect module outputs as raw JSON byte payloads
    async fn output(&self) -> RunnerResult<OutputSet>;
}
