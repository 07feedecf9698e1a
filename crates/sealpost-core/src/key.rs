//! Typed OpenPGP key snapshots.
//!
//! Everything the key-management tool reports is validated into these types
//! once, at the registry boundary. The resolver and the diagnostic engine
//! never see raw listings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Number of hex digits in a long key id.
const KEY_ID_LEN: usize = 16;

/// An upper-case hex OpenPGP fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Parse and normalize a fingerprint.
    ///
    /// Whitespace is removed and the result is upper-cased. v3 (32 digits),
    /// v4 (40 digits) and v5 (64 digits) fingerprints are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidFingerprint`] for non-hex input or an
    /// unexpected length.
    pub fn parse(raw: &str) -> RegistryResult<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        if !matches!(normalized.len(), 32 | 40 | 64) || hex::decode(&normalized).is_err() {
            return Err(RegistryError::InvalidFingerprint(raw.to_owned()));
        }
        Ok(Self(normalized))
    }

    /// The fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The long (16 digit) key id, i.e. the fingerprint's tail.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.0[self.0.len().saturating_sub(KEY_ID_LEN)..]
    }

    /// Whether `suffix` names this key.
    ///
    /// Matching is case-insensitive, tolerates a `0x` prefix and whitespace,
    /// and never matches an empty suffix.
    #[must_use]
    pub fn matches_suffix(&self, suffix: &str) -> bool {
        let trimmed = suffix.trim();
        let trimmed = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let wanted: String = trimmed
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        !wanted.is_empty() && self.0.ends_with(&wanted)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a key can be used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Can produce signatures.
    pub sign: bool,
    /// Can receive encrypted mail.
    pub encrypt: bool,
    /// Can certify other keys.
    pub certify: bool,
    /// Can authenticate.
    pub authenticate: bool,
}

impl Capabilities {
    /// Build from a GnuPG capability field (e.g. `scESC`).
    ///
    /// Only upper-case letters count: they describe what the key as a whole
    /// (primary plus valid subkeys) is usable for.
    #[must_use]
    pub fn from_letters(field: &str) -> Self {
        let mut caps = Self::default();
        for c in field.chars() {
            match c {
                'S' => caps.sign = true,
                'E' => caps.encrypt = true,
                'C' => caps.certify = true,
                'A' => caps.authenticate = true,
                _ => {},
            }
        }
        caps
    }

    /// Capabilities for a key that can both sign and encrypt.
    #[must_use]
    pub fn sign_encrypt() -> Self {
        Self {
            sign: true,
            encrypt: true,
            certify: true,
            authenticate: false,
        }
    }

    /// A key is usable for mail when it can both sign and encrypt.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.sign && self.encrypt
    }

    /// Whether any capability at all is present.
    #[must_use]
    pub fn any(&self) -> bool {
        self.sign || self.encrypt || self.certify || self.authenticate
    }
}

/// A user id bound to a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId {
    /// Display name (may be empty).
    pub name: String,
    /// Email address (may be empty).
    pub email: String,
}

impl UserId {
    /// Create a user id from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Parse an RFC 2822 style user id: `Name (comment) <email>`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(open) = raw.rfind('<')
            && let Some(close) = raw[open..].find('>')
        {
            let email = raw[open.saturating_add(1)..open.saturating_add(close)].trim();
            let mut name = raw[..open].trim();
            if let Some(paren) = name.find('(') {
                name = name[..paren].trim();
            }
            return Self::new(name, email);
        }
        if raw.contains('@') && !raw.contains(' ') {
            return Self::new("", raw);
        }
        Self::new(raw, "")
    }
}

/// A validated snapshot of one key in the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Full fingerprint.
    pub fingerprint: Fingerprint,
    /// Long key id as reported by the tool.
    pub key_id: String,
    /// Key size in bits.
    pub key_size: u32,
    /// Usable capabilities.
    pub capabilities: Capabilities,
    /// Disabled by the owner.
    pub disabled: bool,
    /// Revoked.
    pub revoked: bool,
    /// Expiration date, if any.
    pub expires: Option<NaiveDate>,
    /// User ids in keyring order.
    pub uids: Vec<UserId>,
}

impl KeyInfo {
    /// Whether the key carries a user id with this email (case-insensitive).
    #[must_use]
    pub fn has_email(&self, address: &str) -> bool {
        self.uids
            .iter()
            .any(|uid| uid.email.eq_ignore_ascii_case(address))
    }

    /// Display name of the first user id, if non-empty.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.uids
            .first()
            .map(|uid| uid.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// A key reported by an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedKey {
    /// Fingerprint of the imported key.
    pub fingerprint: Fingerprint,
}

/// Outcome of importing key material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Keys new to the keyring.
    pub imported: Vec<ImportedKey>,
    /// Existing keys that gained user ids, signatures or subkeys.
    pub updated: Vec<ImportedKey>,
    /// Keys that were already present unchanged.
    pub unchanged: usize,
}

impl ImportSummary {
    /// Fingerprints of every key the import touched, updated first.
    #[must_use]
    pub fn changed_fingerprints(&self) -> Vec<&Fingerprint> {
        self.updated
            .iter()
            .chain(&self.imported)
            .map(|k| &k.fingerprint)
            .collect()
    }

    /// Merge another summary into this one.
    pub fn absorb(&mut self, other: Self) {
        self.imported.extend(other.imported);
        self.updated.extend(other.updated);
        self.unchanged = self.unchanged.saturating_add(other.unchanged);
    }
}

/// One key found on a keyserver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Key id (or fingerprint) as reported by the keyserver.
    pub key_id: String,
    /// Key size in bits, if reported.
    pub key_size: Option<u32>,
    /// Creation date, if reported.
    pub created: Option<NaiveDate>,
    /// Expiration date, if reported.
    pub expires: Option<NaiveDate>,
    /// Whether the keyserver flags the key as revoked.
    pub revoked: bool,
    /// User ids.
    pub uids: Vec<UserId>,
}

/// Outcome of certifying a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutcome {
    /// The key that was signed.
    pub key_id: String,
    /// The key used to sign, if one was chosen explicitly.
    pub signing_key: Option<String>,
}
