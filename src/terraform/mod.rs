//! Driving the external terraform binary
//!
//! `backend` defines the seam the lifecycle orchestrator uses, `cli` is
//! the real implementation over the cached binary, `options` holds the
//! typed per-step option structs.

pub mod backend;
pub mod cli;
pub mod options;

pub use backend::{TerraformBackend, WorkspaceList};
pub use cli::TerraformCli;
pub use options::{
    ApplyOptions, DestroyOptions, InitOptions, OutputSet, PlanOptions, PlanResult,
    PLAN_ARTIFACT_PATH,
};
