//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealpost_outgoing::prelude::*;` to import all essential types.

// Errors
pub use crate::{TransformError, TransformResult};

// Pipeline
pub use crate::{OutgoingTransform, TransformOptions, TransformOutcome, TransformPipeline};

// Stages
pub use crate::{MessageWrapper, OpenPgpContentTransform, OpenPgpCryptoTransform, WrapperKind};

// Message model
pub use crate::{Attachment, OutgoingMessage};
