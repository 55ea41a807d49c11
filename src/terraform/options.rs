//! Typed per-step terraform options
//!
//! Each lifecycle step gets one options struct with a fixed set of fields,
//! built once from the run configuration and the discovered var files.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Where the plan artifact is written; kept for external inspection
pub const PLAN_ARTIFACT_PATH: &str = "/tmp/tf-plan";

/// Module outputs keyed by name, each value as its raw JSON bytes
pub type OutputSet = BTreeMap<String, Vec<u8>>;

/// Result of the plan step. Informational only: whether a diff was
/// detected never gates the subsequent apply or destroy.
#[derive(Debug, Clone, Copy)]
pub struct PlanResult {
    pub has_diff: bool,
}

/// Options for `terraform init`
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Upgrade modules and providers to the newest allowed versions
    pub upgrade: bool,
}

impl InitOptions {
    pub fn args(&self) -> Vec<String> {
        let mut args = base_args();
        if self.upgrade {
            args.push("-upgrade".to_string());
        }
        args
    }
}

/// Options for `terraform plan`
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Var files in override order (later files win)
    pub var_files: Vec<PathBuf>,
    /// Where the plan artifact is written
    pub out_path: PathBuf,
}

impl PlanOptions {
    pub fn args(&self) -> Vec<String> {
        let mut args = base_args();
        // Exit code 2 distinguishes "changes present" from "no changes"
        args.push("-detailed-exitcode".to_string());
        args.extend(var_file_args(&self.var_files));
        args.push(format!("-out={}", self.out_path.display()));
        args
    }
}

/// Options for `terraform apply`
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub var_files: Vec<PathBuf>,
}

impl ApplyOptions {
    pub fn args(&self) -> Vec<String> {
        let mut args = base_args();
        args.push("-auto-approve".to_string());
        args.extend(var_file_args(&self.var_files));
        args
    }
}

/// Options for `terraform destroy`
#[derive(Debug, Clone)]
pub struct DestroyOptions {
    pub var_files: Vec<PathBuf>,
}

impl DestroyOptions {
    pub fn args(&self) -> Vec<String> {
        let mut args = base_args();
        args.push("-auto-approve".to_string());
        args.extend(var_file_args(&self.var_files));
        args
    }
}

// The runner is fully non-interactive
fn base_args() -> Vec<String> {
    vec!["-input=false".to_string(), "-no-color".to_string()]
}

fn var_file_args(var_files: &[PathBuf]) -> Vec<String> {
    var_files
        .iter()
        .map(|path| format!("-var-file={}", path.display()))
        .collect()
}
