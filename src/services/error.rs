//! Collaborator error types

use thiserror::Error;

/// Error types for external service calls
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} exited with code {code}: {stderr}")]
    Command {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to parse service output: {0}")]
    Parse(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("{program} did not finish within {timeout:?}")]
    Timeout {
        program: String,
        timeout: std::time::Duration,
    },
}

impl ServiceError {
    /// Build a command error from a finished process
    pub fn command(program: &str, output: &std::process::Output) -> Self {
        ServiceError::Command {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}
