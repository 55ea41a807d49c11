//! Variable-file discovery
//!
//! Collects every eligible variable file under a directory tree. The
//! result is sorted by full path so that override precedence (later files
//! win when handed to terraform) is identical on every run.

use crate::error::{RunnerError, RunnerResult};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const ALLOWED_EXTENSIONS: [&str; 3] = ["tfvars", "tf", "json"];

fn extension_allowed(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext))
}

/// Recursively collect variable files under `root` in sorted path order.
///
/// Directories are walked unconditionally; any listing error is fatal.
pub fn discover_var_files(root: &Path) -> RunnerResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            RunnerError::io(
                format!("listing var files under {}", root.display()),
                e.into(),
            )
        })?;
        if entry.file_type().is_file() && extension_allowed(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!("discovered {} var files under {}", files.len(), root.display());
    Ok(files)
}
