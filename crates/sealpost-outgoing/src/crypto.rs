//! Body wrapping: picks a signing/encryption wrapper from the crypto policy.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{TransformError, TransformResult, WrapError};
use crate::message::OutgoingMessage;
use crate::pipeline::{Cleaner, OutgoingTransform, TransformOptions, TransformOutcome};

/// Which wrapper a crypto policy selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapperKind {
    /// Leave the body alone.
    None,
    /// Sign only.
    Sign,
    /// Encrypt only.
    Encrypt,
    /// Sign, then encrypt.
    SignEncrypt,
}

impl WrapperKind {
    /// Select a wrapper from a free-form policy string.
    ///
    /// Only OpenPGP policies (mentioning `pgp` or `gpg`) select anything.
    #[must_use]
    pub fn from_policy(policy: &str) -> Self {
        let policy = policy.to_ascii_lowercase();
        if !(policy.contains("pgp") || policy.contains("gpg")) {
            return Self::None;
        }
        match (policy.contains("sign"), policy.contains("encrypt")) {
            (true, true) => Self::SignEncrypt,
            (true, false) => Self::Sign,
            (false, true) => Self::Encrypt,
            (false, false) => Self::None,
        }
    }
}

impl fmt::Display for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Sign => "sign",
            Self::Encrypt => "encrypt",
            Self::SignEncrypt => "sign-encrypt",
        })
    }
}

/// Everything a wrapper needs besides the message itself.
pub struct WrapRequest<'a> {
    /// Selected wrapper (never [`WrapperKind::None`]).
    pub kind: WrapperKind,
    /// Sender address.
    pub sender: &'a str,
    /// Recipient addresses.
    pub recipients: &'a [String],
    /// Prefer inline PGP over PGP/MIME.
    pub prefer_inline: bool,
    /// Cleanup callback to run before wrapping.
    pub cleaner: &'a Cleaner,
}

impl fmt::Debug for WrapRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapRequest")
            .field("kind", &self.kind)
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("prefer_inline", &self.prefer_inline)
            .finish_non_exhaustive()
    }
}

/// The collaborator that actually signs and/or encrypts a message.
pub trait MessageWrapper: Send + Sync {
    /// Wrap `message` as `request.kind` asks.
    ///
    /// # Errors
    ///
    /// Any failure aborts message construction.
    fn wrap(
        &self,
        request: &WrapRequest<'_>,
        message: OutgoingMessage,
    ) -> Result<OutgoingMessage, WrapError>;
}

/// Crypto stage that wraps the body according to the crypto policy.
pub struct OpenPgpCryptoTransform {
    wrapper: Arc<dyn MessageWrapper>,
}

impl OpenPgpCryptoTransform {
    /// Create the stage around a wrapper implementation.
    #[must_use]
    pub fn new(wrapper: Arc<dyn MessageWrapper>) -> Self {
        Self { wrapper }
    }
}

impl OutgoingTransform for OpenPgpCryptoTransform {
    fn transform_outgoing(
        &self,
        sender: &str,
        recipients: &[String],
        message: OutgoingMessage,
        options: &TransformOptions,
    ) -> TransformResult<TransformOutcome> {
        let kind = WrapperKind::from_policy(&options.crypto_policy);
        if kind == WrapperKind::None {
            debug!(policy = %options.crypto_policy, "no openpgp wrapper selected");
            return Ok(TransformOutcome::unchanged(sender, recipients, message));
        }

        let request = WrapRequest {
            kind,
            sender,
            recipients,
            prefer_inline: options.prefer_inline,
            cleaner: &options.cleaner,
        };
        let wrapped = self
            .wrapper
            .wrap(&request, message)
            .map_err(|source| TransformError::Wrap { kind, source })?;
        debug!(%kind, sender, "message wrapped");

        Ok(TransformOutcome {
            sender: sender.to_owned(),
            recipients: recipients.to_vec(),
            message: wrapped,
            matched: true,
            proceed: false,
        })
    }
}
