//! Error types for device discovery.

use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while configuring or running a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The discovery tool could not be started.
    #[error("failed to run {exec}: {source}")]
    Spawn {
        exec: String,
        source: std::io::Error,
    },

    /// Reading the tool's output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The discovery tool exited with a failure status.
    #[error("scanner exited with {status}")]
    Failed { status: ExitStatus },

    /// The scan configuration was rejected before anything was run.
    #[error("invalid scan configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;
