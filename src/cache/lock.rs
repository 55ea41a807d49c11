//! Advisory lock over the shared cache directory
//!
//! Multiple job instances can be scheduled against the same cache volume,
//! so the install critical section is guarded by a file lock at a
//! well-known path inside the cache directory. The lock covers the whole
//! directory, not a single version; concurrent installs of different
//! versions sharing a cache serialize on it.

use crate::error::{RunnerError, RunnerResult};
use fs4::FileExt;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Lock file name inside the cache directory
pub const LOCK_FILE_NAME: &str = ".terraform-init.lock";

/// How long to wait for the lock before giving up
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Poll interval between lock attempts
pub const LOCK_POLL: Duration = Duration::from_millis(500);

/// Exclusive advisory lock held for the install critical section.
///
/// Released on drop, on every exit path.
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
    file: File,
}

impl CacheLock {
    /// Acquire the lock with the default timeout and poll interval
    pub async fn acquire(cache_dir: &Path) -> RunnerResult<Self> {
        Self::acquire_with(cache_dir, LOCK_TIMEOUT, LOCK_POLL).await
    }

    /// Acquire the lock, polling until `timeout` elapses
    pub async fn acquire_with(
        cache_dir: &Path,
        timeout: Duration,
        poll: Duration,
    ) -> RunnerResult<Self> {
        let path = cache_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| RunnerError::io(format!("opening cache lock {}", path.display()), e))?;

        debug!("attempting to acquire cache lock at {}", path.display());

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(RunnerError::LockTimeout {
                            path,
                            seconds: timeout.as_secs(),
                        });
                    }
                    tokio::time::sleep(poll).await;
                }
                Err(e) => {
                    return Err(RunnerError::io(format!("locking {}", path.display()), e));
                }
            }
        }

        debug!("cache lock acquired");
        Ok(Self { path, file })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("failed to release cache lock {}: {}", self.path.display(), e);
        } else {
            debug!("released cache lock");
        }
    }
}
