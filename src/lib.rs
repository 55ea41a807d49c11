//! tf-runner - batch Terraform job runner
//!
//! Installs a pinned Terraform binary into a cache shared across job
//! instances, drives one init/plan/apply (or destroy) cycle against a
//! project, and publishes the module outputs to a pre-existing
//! Kubernetes Secret.

pub mod cache;
pub mod config;
pub mod error;
pub mod install;
pub mod publish;
pub mod runner;
pub mod terraform;
pub mod vars;

pub use error::{RunnerError, RunnerResult};
