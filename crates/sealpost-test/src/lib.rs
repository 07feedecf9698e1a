//! Sealpost Test - shared mocks and fixtures.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! sealpost-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use sealpost_test::{KeyFixture, MockKeyRegistry};
//!
//! let registry = MockKeyRegistry::new()
//!     .with_secret_key(KeyFixture::new('A').size(4096).uid("Alice", "alice@example.org").build());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
