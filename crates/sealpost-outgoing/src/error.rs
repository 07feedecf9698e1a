//! Transform error types.

use thiserror::Error;

use crate::crypto::WrapperKind;

/// Boxed error returned by a [`MessageWrapper`](crate::MessageWrapper).
pub type WrapError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort outgoing message construction.
///
/// Lookup misses and registry failures never show up here: they degrade to
/// "no header, no attachment" inside the content stage.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The signing/encryption wrapper failed.
    #[error("{kind} wrapper failed: {source}")]
    Wrap {
        /// Wrapper that was applied.
        kind: WrapperKind,
        /// Underlying failure.
        #[source]
        source: WrapError,
    },

    /// A stage with this name is already registered.
    #[error("transform stage '{0}' is already registered")]
    DuplicateStage(String),
}

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;
