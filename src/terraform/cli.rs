//! Terraform CLI execution
//!
//! Wraps one installed binary plus one project directory and implements
//! [`TerraformBackend`] by spawning subcommands. Every invocation is
//! synchronous from the lifecycle's point of view: spawn, wait, inspect
//! the exit status.

use crate::error::{RunnerError, RunnerResult};
use crate::terraform::backend::{TerraformBackend, WorkspaceList};
use crate::terraform::options::{ApplyOptions, DestroyOptions, InitOptions, OutputSet, PlanOptions};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Execution handle over the cached terraform binary
#[derive(Debug, Clone)]
pub struct TerraformCli {
    exec_path: PathBuf,
    project_dir: PathBuf,
}

impl TerraformCli {
    /// Bind an executable to a project directory
    pub fn new(exec_path: impl Into<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            exec_path: exec_path.into(),
            project_dir: project_dir.into(),
        }
    }

    async fn exec(&self, step: &'static str, args: &[String]) -> RunnerResult<Output> {
        debug!(
            "executing: {} {}",
            self.exec_path.display(),
            args.join(" ")
        );

        Command::new(&self.exec_path)
            .args(args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RunnerError::command_failed(format!("terraform {step}"), e))
    }

    /// Execute a step that succeeds only on exit code zero
    async fn run(&self, step: &'static str, args: &[String]) -> RunnerResult<Output> {
        let output = self.exec(step, args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(RunnerError::Step {
                step,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl TerraformBackend for TerraformCli {
    async fn init(&self, opts: &InitOptions) -> RunnerResult<()> {
        let mut args = vec!["init".to_string()];
        args.extend(opts.args());
        self.run("init", &args).await?;
        Ok(())
    }

    async fn workspace_list(&self) -> RunnerResult<WorkspaceList> {
        let args = vec!["workspace".to_string(), "list".to_string()];
        let output = self.run("workspace list", &args).await?;
        Ok(parse_workspace_list(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    async fn workspace_select(&self, name: &str) -> RunnerResult<()> {
        let args = vec![
            "workspace".to_string(),
            "select".to_string(),
            name.to_string(),
        ];
        self.run("workspace select", &args).await?;
        Ok(())
    }

    async fn workspace_new(&self, name: &str) -> RunnerResult<()> {
        let args = vec![
            "workspace".to_string(),
            "new".to_string(),
            name.to_string(),
        ];
        self.run("workspace new", &args).await?;
        Ok(())
    }

    async fn plan(&self, opts: &PlanOptions) -> RunnerResult<bool> {
        let mut args = vec!["plan".to_string()];
        args.extend(opts.args());

        // -detailed-exitcode: 0 = clean no-diff, 2 = clean with diff
        let output = self.exec("plan", &args).await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(2) => Ok(true),
            _ => Err(RunnerError::Step {
                step: "plan",
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    async fn apply(&self, opts: &ApplyOptions) -> RunnerResult<()> {
        let mut args = vec!["apply".to_string()];
        args.extend(opts.args());
        self.run("apply", &args).await?;
        Ok(())
    }

    async fn destroy(&self, opts: &DestroyOptions) -> RunnerResult<()> {
        let mut args = vec!["destroy".to_string()];
        args.extend(opts.args());
        self.run("destroy", &args).await?;
        Ok(())
    }

    async fn output(&self) -> RunnerResult<OutputSet> {
        let args = vec![
            "output".to_string(),
            "-json".to_string(),
            "-no-color".to_string(),
        ];
        let output = self.run("output", &args).await?;
        parse_outputs(&output.stdout)
    }
}

/// Parse `terraform workspace list` output; the current workspace carries
/// a `*` marker. An unmarked listing means the default workspace.
fn parse_workspace_list(listing: &str) -> WorkspaceList {
    let mut names = Vec::new();
    let mut current = "default".to_string();

    for line in listing.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(marked) = trimmed.strip_prefix('*') {
            let name = marked.trim().to_string();
            current = name.clone();
            names.push(name);
        } else {
            names.push(trimmed.to_string());
        }
    }

    WorkspaceList { names, current }
}

#[derive(Deserialize)]
struct OutputMeta<'a> {
    #[serde(borrow)]
    value: &'a serde_json::value::RawValue,
}

/// Parse `terraform output -json` into raw JSON byte payloads, keeping
/// each value exactly as the tool encoded it (strings stay quoted).
fn parse_outputs(stdout: &[u8]) -> RunnerResult<OutputSet> {
    let parsed: std::collections::BTreeMap<String, OutputMeta<'_>> =
        serde_json::from_slice(stdout)?;

    Ok(parsed
        .into_iter()
        .map(|(name, meta)| (name, meta.value.get().as_bytes().to_vec()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terraform::options::PLAN_ARTIFACT_PATH;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn parses_workspace_listing() {
        let listing = "  default\n* dev\n  staging\n";
        let list = parse_workspace_list(listing);
        assert_eq!(list.names, vec!["default", "dev", "staging"]);
        assert_eq!(list.current, "dev");
    }

    #[test]
    fn unmarked_listing_defaults_current() {
        let list = parse_workspace_list("  default\n");
        assert_eq!(list.current, "default");
    }

    #[test]
    fn parses_outputs_as_raw_json() {
        let stdout = br#"{
            "result": {"sensitive": false, "type": "string", "value": "xyz"},
            "count": {"sensitive": false, "type": "number", "value": 3}
        }"#;

        let outputs = parse_outputs(stdout).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs["result"], b"\"xyz\"");
        assert_eq!(outputs["count"], b"3");
    }

    #[test]
    fn empty_output_set_parses() {
        let outputs = parse_outputs(b"{}").unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn malformed_output_is_an_error() {
        assert!(parse_outputs(b"not json").is_err());
    }

    // Exercise the process plumbing against a stub standing in for the
    // real binary.
    #[cfg(unix)]
    fn write_stub(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("terraform");
        std::fs::write(&path, format!("#!/bin/sh\n{script}")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn plan_exit_code_two_means_diff() {
        let dir = TempDir::new().unwrap();
        let stub = write_stub(dir.path(), "exit 2");
        let cli = TerraformCli::new(stub, dir.path());

        let opts = PlanOptions {
            var_files: vec![],
            out_path: PathBuf::from(PLAN_ARTIFACT_PATH),
        };
        assert!(cli.plan(&opts).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn plan_exit_code_zero_means_no_diff() {
        let dir = TempDir::new().unwrap();
        let stub = write_stub(dir.path(), "exit 0");
        let cli = TerraformCli::new(stub, dir.path());

        let opts = PlanOptions {
            var_files: vec![],
            out_path: PathBuf::from(PLAN_ARTIFACT_PATH),
        };
        assert!(!cli.plan(&opts).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_step_surfaces_stderr() {
        let dir = TempDir::new().unwrap();
        let stub = write_stub(dir.path(), "echo 'backend unreachable' >&2\nexit 1");
        let cli = TerraformCli::new(stub, dir.path());

        let err = cli.init(&InitOptions { upgrade: true }).await.unwrap_err();
        match err {
            RunnerError::Step { step, stderr } => {
                assert_eq!(step, "init");
                assert!(stderr.contains("backend unreachable"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
