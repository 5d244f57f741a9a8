//! CLI-specific error types and mappings.
//!
//! Maps task manager and adapter errors to exit codes and user-facing
//! messages.

use fsb_core::{BackendError, TaskError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A task failed or was refused.
    #[error("{0}")]
    Task(String),

    /// Argument error (unknown id, missing file).
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The server could not be reached or answered with an error status.
    #[error("Server unavailable: {0}")]
    Unavailable(String),

    /// The API refused the session.
    #[error("Not authenticated (set FSB_TOKEN or pass --token)")]
    Unauthenticated,

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ctrl-C while waiting for a task.
    #[error("Interrupted; the task stays queued, run 'fsb watch' to follow it")]
    Interrupted,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions (see sysexits.h).
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Task(_) => 1,
            Self::Arguments(_) => 2,   // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,         // EX_IOERR
            Self::Unauthenticated => 77, // EX_NOPERM
            Self::Config(_) => 78,     // EX_CONFIG
            Self::Interrupted => 130,
        }
    }
}

impl From<TaskError> for CliError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Backend(BackendError::Unauthenticated) => Self::Unauthenticated,
            TaskError::Backend(BackendError::Transport { .. }) => {
                Self::Unavailable(err.user_message())
            }
            TaskError::NotInQueue { .. } | TaskError::NotReady { .. } => {
                Self::Arguments(err.user_message())
            }
            _ => Self::Task(err.user_message()),
        }
    }
}

impl From<BackendError> for CliError {
    fn from(err: BackendError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
