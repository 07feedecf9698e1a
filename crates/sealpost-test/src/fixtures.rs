//! Key and profile fixtures.

use chrono::NaiveDate;
use sealpost_core::{Capabilities, Fingerprint, KeyInfo, KeyRef, ProfileRecord, UserId};

/// A 40-digit fingerprint made of `digit` repeated.
///
/// # Panics
///
/// Panics if `digit` is not a hex digit.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn fingerprint(digit: char) -> Fingerprint {
    Fingerprint::parse(&digit.to_string().repeat(40)).unwrap()
}

/// Builder for [`KeyInfo`] snapshots.
///
/// Defaults to a healthy 4096-bit sign+encrypt key with no expiry and no
/// user ids.
#[derive(Debug, Clone)]
pub struct KeyFixture {
    key: KeyInfo,
}

impl KeyFixture {
    /// Start a key whose fingerprint is `digit` repeated.
    #[must_use]
    pub fn new(digit: char) -> Self {
        let fpr = fingerprint(digit);
        Self {
            key: KeyInfo {
                key_id: fpr.key_id().to_owned(),
                fingerprint: fpr,
                key_size: 4096,
                capabilities: Capabilities::sign_encrypt(),
                disabled: false,
                revoked: false,
                expires: None,
                uids: Vec::new(),
            },
        }
    }

    /// Set the key size.
    #[must_use]
    pub fn size(mut self, bits: u32) -> Self {
        self.key.key_size = bits;
        self
    }

    /// Set the capabilities.
    #[must_use]
    pub fn caps(mut self, caps: Capabilities) -> Self {
        self.key.capabilities = caps;
        self
    }

    /// Remove every capability.
    #[must_use]
    pub fn no_caps(self) -> Self {
        self.caps(Capabilities::default())
    }

    /// Mark as disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.key.disabled = true;
        self
    }

    /// Mark as revoked.
    #[must_use]
    pub fn revoked(mut self) -> Self {
        self.key.revoked = true;
        self
    }

    /// Set the expiration date.
    #[must_use]
    pub fn expires(mut self, date: NaiveDate) -> Self {
        self.key.expires = Some(date);
        self
    }

    /// Add a user id.
    #[must_use]
    pub fn uid(mut self, name: &str, email: &str) -> Self {
        self.key.uids.push(UserId::new(name, email));
        self
    }

    /// Finish the key.
    #[must_use]
    pub fn build(self) -> KeyInfo {
        self.key
    }
}

/// A profile record with the given key references and directive.
#[must_use]
pub fn test_profile(name: &str, email: &str, keys: &[&str], crypto_format: &str) -> ProfileRecord {
    ProfileRecord {
        id: email.to_owned(),
        name: name.to_owned(),
        email: email.to_owned(),
        keys: keys.iter().map(|k| KeyRef::new(*k)).collect(),
        signing_key: None,
        crypto_format: crypto_format.to_owned(),
    }
}
