//! Diagnostic engine errors.

use sealpost_core::RegistryError;
use thiserror::Error;

/// Errors that stop a diagnosis from producing a verdict.
///
/// Unhealthy keys are findings, not errors.
#[derive(Debug, Error)]
pub enum DoctorError {
    /// The secret keyring could not be listed.
    #[error("cannot list secret keys: {0}")]
    Registry(#[from] RegistryError),
}

/// Result type for diagnostic operations.
pub type DoctorResult<T> = Result<T, DoctorError>;
