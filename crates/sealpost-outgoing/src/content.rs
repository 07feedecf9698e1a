//! Content stage: OpenPGP advertisement header and public-key attachment.

use std::sync::Arc;

use sealpost_core::{KeyInfo, KeyRegistry, ProfileStore, extract_address};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::TransformResult;
use crate::header::{HeaderCode, HeaderDirective};
use crate::message::{Attachment, OutgoingMessage};
use crate::pipeline::{OutgoingTransform, TransformOptions, TransformOutcome};

/// Advertisement header set on outgoing mail.
pub const OPENPGP_HEADER: &str = "OpenPGP";

/// Header asking for the sender's public key to be attached.
pub const ATTACH_PUBKEY_HEADER: &str = "Attach-PGP-Pubkey";

/// Internal header recording how many keys were attached.
pub const PUBKEYS_ATTACHED_HEADER: &str = "X-Sealpost-Pubkeys-Attached";

/// Media type of attached keys.
pub const PGP_KEYS_MEDIA_TYPE: &str = "application/pgp-keys";

const GENERIC_KEY_FILENAME: &str = "My encryption key.asc";

/// Content stage that advertises the sender's key and optionally attaches it.
///
/// Never matches and always lets the chain proceed; every lookup failure
/// degrades to "no header" or "no attachment".
pub struct OpenPgpContentTransform {
    registry: Arc<dyn KeyRegistry>,
    profiles: Arc<dyn ProfileStore>,
    global_preference: Option<String>,
}

impl OpenPgpContentTransform {
    /// Create the stage.
    ///
    /// `global_preference` is the `prefs.openpgp_header` keyword; blank
    /// values count as unset.
    #[must_use]
    pub fn new(
        registry: Arc<dyn KeyRegistry>,
        profiles: Arc<dyn ProfileStore>,
        global_preference: Option<String>,
    ) -> Self {
        Self {
            registry,
            profiles,
            global_preference: global_preference
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
        }
    }

    /// The `OpenPGP` header value for `address`, if one should be sent.
    #[must_use]
    pub fn advertisement(&self, address: &str) -> Option<String> {
        let (key_id, directive) = match self.profiles.profile(address) {
            Some(profile) => (
                profile.key_id.filter(|k| !k.trim().is_empty()),
                HeaderDirective::from_crypto_format(&profile.crypto_format),
            ),
            None => (None, HeaderDirective::Absent),
        };

        if let HeaderDirective::Malformed(code) = &directive {
            debug!(sender = %address, code = %code, "ignoring malformed openpgp_header directive");
        }
        let code = directive.resolve(self.global_preference.is_some())?;
        if code == HeaderCode::Unprotected {
            return None;
        }

        let key_id = key_id.or_else(|| self.fallback_key_id(address))?;
        let preference = code.preference(self.global_preference.as_deref())?;
        Some(format!("id={key_id}; preference={preference}"))
    }

    /// First sign+encrypt secret key bound to `address`, by fingerprint.
    fn fallback_key_id(&self, address: &str) -> Option<String> {
        let keys = match self.registry.list_secret_keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(sender = %address, error = %e, "secret key lookup failed, omitting OpenPGP header");
                return None;
            },
        };
        let found = keys
            .iter()
            .filter(|k| k.capabilities.is_usable())
            .find(|k| k.has_email(address))
            .map(|k| k.fingerprint.to_string());
        if found.is_none() {
            debug!(sender = %address, "no usable secret key for sender");
        }
        found
    }

    /// Attach every capable public key bound to `address`; returns the count.
    fn attach_public_keys(&self, address: &str, message: &mut OutgoingMessage) -> usize {
        let keys = match self.registry.address_to_keys(address) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(sender = %address, error = %e, "key lookup failed, not attaching keys");
                return 0;
            },
        };

        let mut attached = 0_usize;
        for key in keys.iter().filter(|k| k.capabilities.any()) {
            let data = match self.registry.public_key(&key.key_id) {
                Ok(data) => data,
                Err(e) => {
                    warn!(fingerprint = %key.fingerprint, error = %e, "public key export failed");
                    continue;
                },
            };
            let mut attachment =
                Attachment::base64(PGP_KEYS_MEDIA_TYPE, key_filename(key), make_content_id(), &data);
            attachment.crypto = message.crypto.clone();
            message.attach(attachment);
            attached = attached.saturating_add(1);
        }
        attached
    }
}

impl OutgoingTransform for OpenPgpContentTransform {
    fn transform_outgoing(
        &self,
        sender: &str,
        recipients: &[String],
        mut message: OutgoingMessage,
        _options: &TransformOptions,
    ) -> TransformResult<TransformOutcome> {
        let address = extract_address(sender).unwrap_or_else(|| sender.trim());

        if let Some(value) = self.advertisement(address) {
            debug!(sender = %address, header = %value, "advertising openpgp key");
            message.set_header(OPENPGP_HEADER, value);
        }

        if wants_pubkey(&message) {
            let count = self.attach_public_keys(address, &mut message);
            if count > 0 {
                info!(sender = %address, count, "attached public keys");
                message.set_header(PUBKEYS_ATTACHED_HEADER, count.to_string());
            }
        }

        Ok(TransformOutcome::unchanged(sender, recipients, message))
    }
}

/// Whether the message asks for the sender's key to be attached.
fn wants_pubkey(message: &OutgoingMessage) -> bool {
    message.header(ATTACH_PUBKEY_HEADER).is_some_and(|v| {
        let v = v.trim().to_ascii_lowercase();
        v.starts_with("yes") || v.starts_with("tru")
    })
}

fn key_filename(key: &KeyInfo) -> String {
    key.first_name().map_or_else(
        || GENERIC_KEY_FILENAME.to_owned(),
        |name| format!("Encryption key for {name}.asc"),
    )
}

fn make_content_id() -> String {
    format!("<{}@sealpost>", Uuid::new_v4().simple())
}
