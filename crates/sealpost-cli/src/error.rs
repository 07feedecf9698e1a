//! Command errors.

use std::path::PathBuf;

use sealpost_core::{BrokerError, RegistryError};
use sealpost_doctor::DoctorError;
use sealpost_outgoing::TransformError;
use thiserror::Error;

/// Errors a key command can fail with.
///
/// Refusals (lockdown) and failed health checks are not errors: they are
/// error-shaped [`CommandOutcome`](crate::CommandOutcome)s.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required argument was not supplied.
    #[error("{0}")]
    MissingArgument(String),

    /// The key registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A key file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    ReadKeyFile {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Outbound HTTP is not permitted.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// A key URL was unusable.
    #[error("invalid key URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Fetching a key URL failed.
    #[error("fetching {url} failed: {source}")]
    Fetch {
        /// The URL being fetched.
        url: String,
        /// Underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// Reading a fetched body failed.
    #[error("reading {url} failed: {source}")]
    FetchRead {
        /// The URL being fetched.
        url: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A fetched key exceeded the size limit.
    #[error("{url} is larger than {limit} bytes")]
    FetchTooLarge {
        /// The URL being fetched.
        url: String,
        /// Configured limit.
        limit: u64,
    },

    /// The health check could not run.
    #[error(transparent)]
    Doctor(#[from] DoctorError),

    /// The outgoing preview failed.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Result type for commands.
pub type CommandResult<T> = Result<T, CommandError>;
