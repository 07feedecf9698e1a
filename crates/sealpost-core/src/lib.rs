//! Sealpost Core - Foundation types and traits shared by every Sealpost crate.
//!
//! This crate provides:
//! - Typed OpenPGP key snapshots ([`KeyInfo`], [`Fingerprint`], [`Capabilities`])
//! - The [`KeyRegistry`] trait over the external key-management tool
//! - The [`ProfileStore`] trait over the identity store
//! - The process-wide [`ParseCache`] invalidation contract
//! - The [`ConnectionBroker`] for scoped outbound network access
//!
//! # Example
//!
//! ```
//! use sealpost_core::{Capabilities, Fingerprint};
//!
//! let fpr = Fingerprint::parse("0123456789abcdef0123456789ABCDEF01234567").unwrap();
//! assert_eq!(fpr.key_id(), "89ABCDEF01234567");
//! assert!(fpr.matches_suffix("01234567"));
//!
//! let caps = Capabilities::from_letters("scESC");
//! assert!(caps.is_usable());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod address;
pub mod broker;
pub mod cache;
mod error;
mod key;
pub mod profile;
mod registry;

pub use address::extract_address;
pub use broker::{BrokerError, ConnectionBroker, ConnectionGuard, NetCapability};
pub use cache::{CacheScope, ParseCache};
pub use error::{RegistryError, RegistryResult};
pub use key::{
    Capabilities, Fingerprint, ImportSummary, ImportedKey, KeyInfo, SearchHit, SignOutcome,
    UserId,
};
pub use profile::{KeyRef, Profile, ProfileRecord, ProfileStore};
pub use registry::KeyRegistry;
