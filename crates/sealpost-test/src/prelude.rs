//! Prelude module - commonly used test utilities.
//!
//! Use `use sealpost_test::prelude::*;` to import all essential helpers.

pub use crate::{KeyFixture, fingerprint, test_profile};
pub use crate::{MockKeyRegistry, MockProfileStore, RecordingParseCache, RecordingWrapper};
