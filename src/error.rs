//! Error types for the code sandbox.
//!
//! These never cross the [`crate::CodeExecutor`] boundary: the runner folds
//! every variant into an [`crate::ExecutionResult`].

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sandbox operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to create or write the generated script.
    #[error("failed to create script artifact in {dir}: {source}")]
    ArtifactCreation {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter process could not be started.
    #[error("Failed to launch {interpreter}: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on or reading from the child process failed.
    #[error("failed while waiting for child process: {0}")]
    Wait(#[source] std::io::Error),

    /// The current working directory could not be determined.
    #[error("failed to resolve working directory: {0}")]
    WorkingDir(#[source] std::io::Error),

    /// Sandbox configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("failed to parse config file {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// IO error outside of process management.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sandbox operations.
pub type Result<T> = std::result::Result<T, Error>;
