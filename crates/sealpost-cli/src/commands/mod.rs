//! Command implementations.

pub mod check;
pub mod keys;
pub mod preview;

pub use check::check_keys;
pub use keys::{KeyCommands, LOCKDOWN_MESSAGE};
pub use preview::{PreviewReport, PreviewRequest, preview};
