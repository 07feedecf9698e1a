//! Sealpost CLI - the command layer behind the `sealpost` binary.
//!
//! Commands return a [`CommandOutcome`] (status, message, JSON result and a
//! text rendering). Keyring-mutating commands go through [`KeyCommands`],
//! which enforces lockdown and invalidates the parse cache.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod commands;
pub mod config_bridge;
mod error;
pub mod fetch;
mod outcome;
pub mod parse_cache;
mod theme;

pub use commands::{KeyCommands, LOCKDOWN_MESSAGE, PreviewRequest, check_keys, preview};
pub use config_bridge::ConfigProfileStore;
pub use error::{CommandError, CommandResult};
pub use fetch::{HttpKeyFetcher, KeyFetcher};
pub use outcome::{CommandOutcome, CommandStatus, OutputFormat};
pub use parse_cache::FsParseCache;
