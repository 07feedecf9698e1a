//! Sealpost Outgoing - decides how each outgoing message is protected.
//!
//! Two stages plug into a [`TransformPipeline`]:
//!
//! - [`OpenPgpContentTransform`] sets the `OpenPGP: id=…; preference=…`
//!   advertisement header from the sender's profile (falling back to the
//!   keyring) and attaches the sender's public keys on request.
//! - [`OpenPgpCryptoTransform`] picks a [`WrapperKind`] from the crypto
//!   policy and hands the message to a [`MessageWrapper`].
//!
//! # Example
//!
//! ```
//! use sealpost_outgoing::{HeaderCode, WrapperKind};
//!
//! assert_eq!(HeaderCode::parse("se").unwrap().preference(None), Some("signencrypt"));
//! assert_eq!(WrapperKind::from_policy("pgp-sign-encrypt"), WrapperKind::SignEncrypt);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod content;
mod crypto;
mod error;
mod header;
mod message;
mod pipeline;

pub use content::{
    ATTACH_PUBKEY_HEADER, OPENPGP_HEADER, OpenPgpContentTransform, PGP_KEYS_MEDIA_TYPE,
    PUBKEYS_ATTACHED_HEADER,
};
pub use crypto::{MessageWrapper, OpenPgpCryptoTransform, WrapRequest, WrapperKind};
pub use error::{TransformError, TransformResult, WrapError};
pub use header::{HeaderCode, HeaderDirective};
pub use message::{Attachment, CryptoState, OutgoingMessage};
pub use pipeline::{Cleaner, OutgoingTransform, TransformOptions, TransformOutcome, TransformPipeline};

/// Stage name both OpenPGP stages register under.
pub const OPENPGP_STAGE: &str = "500_openpgp";
