//! Key registry error types.

use thiserror::Error;

/// Errors surfaced by a [`KeyRegistry`](crate::KeyRegistry) implementation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The key-management tool could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The key-management tool exited unsuccessfully.
    #[error("{operation} failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        /// Operation that was attempted.
        operation: String,
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured diagnostic output.
        stderr: String,
    },

    /// A registry record could not be validated into a typed value.
    #[error("malformed registry record: {0}")]
    Malformed(String),

    /// An invalid fingerprint was supplied or returned.
    #[error("invalid fingerprint '{0}'")]
    InvalidFingerprint(String),

    /// The requested key does not exist.
    #[error("no such key: {0}")]
    KeyNotFound(String),

    /// I/O error while talking to the tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for key registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
