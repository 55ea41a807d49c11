//! Pinned terraform binary cache
//!
//! Guarantees that the requested version exists at a deterministic path
//! inside a cache directory shared across job instances. Installs happen
//! at most once per version; a cache hit short-circuits without any
//! network work. The whole check-or-install section runs under the
//! cache-directory lock.

use crate::cache::lock::CacheLock;
use crate::error::{RunnerError, RunnerResult};
use crate::install::Installer;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An installed, executable terraform binary in the shared cache
#[derive(Debug, Clone)]
pub struct CachedBinary {
    /// Exact version pin
    pub version: String,
    /// Deterministic path inside the cache directory
    pub path: PathBuf,
}

/// Cache of pinned terraform binaries in one shared directory
#[derive(Debug, Clone)]
pub struct BinaryCache {
    cache_dir: PathBuf,
}

impl BinaryCache {
    /// Create a cache over `cache_dir` (created on first use)
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Deterministic location of a version inside the cache
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.cache_dir.join(format!("terraform-{version}"))
    }

    /// Ensure the pinned version is present and executable, installing it
    /// if absent. Serialized across processes by the cache-directory lock.
    pub async fn ensure(
        &self,
        version: &str,
        installer: &dyn Installer,
    ) -> RunnerResult<CachedBinary> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| {
                RunnerError::io(
                    format!("creating cache directory {}", self.cache_dir.display()),
                    e,
                )
            })?;

        let _lock = CacheLock::acquire(&self.cache_dir).await?;

        let target = self.binary_path(version);
        if tokio::fs::metadata(&target).await.is_ok() {
            ensure_executable(&target)?;
            info!("found cached terraform binary at {}", target.display());
            return Ok(CachedBinary {
                version: version.to_string(),
                path: target,
            });
        }

        info!("installing terraform {version}");

        // Scratch lives inside the cache directory so the final rename
        // stays on one filesystem and is atomic.
        let scratch = tempfile::Builder::new()
            .prefix("terraform-install-")
            .tempdir_in(&self.cache_dir)
            .map_err(|e| RunnerError::io("creating install scratch directory", e))?;

        let produced = installer.install(version, scratch.path()).await?;

        // The deterministic path is only ever written by this rename; a
        // failed install never leaves a partial artifact there.
        tokio::fs::rename(&produced, &target).await.map_err(|e| {
            RunnerError::install(version, format!("moving binary into cache: {e}"))
        })?;
        set_executable(&target)?;

        debug!("installed terraform binary at {}", target.display());
        Ok(CachedBinary {
            version: version.to_string(),
            path: target,
        })
    }
}

fn set_executable(path: &Path) -> RunnerResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| RunnerError::io(format!("setting permissions on {}", path.display()), e))?;
    }
    Ok(())
}

/// Repair the executable bit on a cached binary if it was lost
fn ensure_executable(path: &Path) -> RunnerResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let meta = std::fs::metadata(path)
            .map_err(|e| RunnerError::io(format!("inspecting {}", path.display()), e))?;
        if meta.permissions().mode() & 0o111 == 0 {
            debug!("restoring executable bit on {}", path.display());
            set_executable(path)?;
        }
    }
    Ok(())
}
