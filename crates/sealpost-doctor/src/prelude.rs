//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealpost_doctor::prelude::*;` to import all essential types.

// Errors
pub use crate::{DoctorError, DoctorResult};

// Engine
pub use crate::{DiagnoseOptions, Doctor, HealthPolicy, KeyHealth};

// Output
pub use crate::{Finding, FindingKind, Verdict};
