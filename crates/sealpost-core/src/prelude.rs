//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealpost_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{RegistryError, RegistryResult};

// Keys
pub use crate::{Capabilities, Fingerprint, KeyInfo, UserId};

// Collaborators
pub use crate::{KeyRegistry, ParseCache, ProfileStore};

// Profiles
pub use crate::{KeyRef, Profile, ProfileRecord};

// Network and cache
pub use crate::{CacheScope, ConnectionBroker, NetCapability};
