//! Sealpost Doctor - key health diagnostics.
//!
//! [`Doctor::diagnose`] classifies every secret key (see [`health`] for the
//! check order), cross-checks the configured default key and every identity
//! profile against the bad keys, and returns a [`Verdict`] with findings and
//! ordered remediation step-groups.
//!
//! # Example
//!
//! ```
//! use sealpost_doctor::{HealthPolicy, KeyHealth};
//!
//! let policy = HealthPolicy::default();
//! assert_eq!(policy.min_key_bits, 2048);
//! assert!(KeyHealth::TooSmall(1024).is_serious());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod doctor;
mod error;
pub mod health;
pub mod remedy;
mod verdict;

pub use doctor::{DiagnoseOptions, Doctor};
pub use error::{DoctorError, DoctorResult};
pub use health::{HealthPolicy, KeyHealth};
pub use verdict::{Finding, FindingKind, Verdict};
