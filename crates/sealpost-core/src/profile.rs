//! Identity profiles and the store that owns them.

use serde::{Deserialize, Serialize};

/// A reference from a profile to a key.
///
/// Stored as `<anything>,<FINGERPRINT>`; only the last comma-separated
/// segment identifies the key, and it may be a fingerprint suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRef(pub String);

impl KeyRef {
    /// Create a key reference.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The fingerprint (or suffix) this reference points at.
    #[must_use]
    pub fn fingerprint_part(&self) -> &str {
        self.0.rsplit(',').next().unwrap_or_default().trim()
    }

    /// Whether the reference is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// The per-sender view the resolver needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// Key id bound for signing, if any.
    pub key_id: Option<String>,
    /// Crypto-format directive (`+`-joined segments).
    pub crypto_format: String,
}

/// A complete profile record as enumerated by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    /// Stable record id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Key references in preference order.
    pub keys: Vec<KeyRef>,
    /// Explicit signing key id; defaults to the first key reference.
    pub signing_key: Option<String>,
    /// Crypto-format directive.
    pub crypto_format: String,
}

impl ProfileRecord {
    /// Key references to audit.
    ///
    /// With `all` every non-blank reference is returned; otherwise only the
    /// first reference, blank or not.
    #[must_use]
    pub fn key_refs(&self, all: bool) -> Vec<&KeyRef> {
        if all {
            self.keys.iter().filter(|k| !k.is_empty()).collect()
        } else {
            self.keys.first().into_iter().collect()
        }
    }

    /// Reduce to the per-sender view.
    #[must_use]
    pub fn to_profile(&self) -> Profile {
        let key_id = self
            .signing_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.keys
                    .first()
                    .map(KeyRef::fingerprint_part)
                    .filter(|k| !k.is_empty())
                    .map(str::to_owned)
            });
        Profile {
            key_id,
            crypto_format: self.crypto_format.clone(),
        }
    }
}

/// Read-only access to the user's identity profiles.
pub trait ProfileStore: Send + Sync {
    /// All profile records, in store order.
    fn profiles(&self) -> Vec<ProfileRecord>;

    /// The profile for `email`, matched case-insensitively.
    fn profile(&self, email: &str) -> Option<Profile> {
        self.profiles()
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .map(ProfileRecord::to_profile)
    }
}
