//! Error types for the runner
//!
//! All modules use `RunnerResult<T>` as their return type. Every error is
//! fatal to the run; there is no retry anywhere in the core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for runner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// All errors that can occur during a run
#[derive(Error, Debug)]
pub enum RunnerError {
    // Configuration errors
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    #[error("failed to create kubernetes client: {0}")]
    KubeClient(String),

    // Cache / install errors
    #[error("timed out waiting for cache lock {path} after {seconds}s")]
    LockTimeout { path: PathBuf, seconds: u64 },

    #[error("failed to install terraform {version}: {reason}")]
    Install { version: String, reason: String },

    #[error("checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },

    #[error("download failed: {url}: {reason}")]
    Download { url: String, reason: String },

    // Lifecycle step errors
    #[error("terraform {step} failed: {stderr}")]
    Step { step: &'static str, stderr: String },

    #[error("failed to parse terraform output: {0}")]
    OutputParse(#[from] serde_json::Error),

    // Publish errors
    #[error("output secret {namespace}/{name} not found")]
    SecretMissing { namespace: String, name: String },

    #[error("failed to publish outputs to secret {namespace}/{name}: {reason}")]
    Publish {
        namespace: String,
        name: String,
        reason: String,
    },

    // IO / process errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create an install error
    pub fn install(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Install {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error occurred after apply/destroy already mutated
    /// infrastructure. Publication is not transactional with the mutation,
    /// so these require re-publishing rather than re-running the job.
    pub fn infrastructure_mutated(&self) -> bool {
        matches!(self, Self::SecretMissing { .. } | Self::Publish { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SecretMissing { .. } => {
                Some("Create the output secret before running the job; it is never created here")
            }
            Self::LockTimeout { .. } => {
                Some("Another job may be holding the cache lock; check for stuck runners sharing the cache volume")
            }
            _ => None,
        }
    }
}
