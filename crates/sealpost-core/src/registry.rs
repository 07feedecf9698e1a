//! The key registry seam.

use crate::error::RegistryResult;
use crate::key::{ImportSummary, KeyInfo, SearchHit, SignOutcome};

/// Capability-only interface over the external key-management tool.
///
/// Implementations return validated [`KeyInfo`] snapshots in keyring order;
/// every call is a blocking call-and-return and is never retried here.
pub trait KeyRegistry: Send + Sync {
    /// Every secret key in the keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be queried.
    fn list_secret_keys(&self) -> RegistryResult<Vec<KeyInfo>>;

    /// Every public key bound to `address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be queried.
    fn address_to_keys(&self, address: &str) -> RegistryResult<Vec<KeyInfo>>;

    /// Import ASCII-armored key material.
    ///
    /// # Errors
    ///
    /// Returns an error if the import fails.
    fn import_keys(&self, armored: &str) -> RegistryResult<ImportSummary>;

    /// Export the ASCII-armored public key for `key_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be exported.
    fn public_key(&self, key_id: &str) -> RegistryResult<Vec<u8>>;

    /// Search the configured keyserver.
    ///
    /// # Errors
    ///
    /// Returns an error if the search fails.
    fn search_key(&self, query: &str) -> RegistryResult<Vec<SearchHit>>;

    /// Fetch a key from the configured keyserver into the keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be received.
    fn receive_key(&self, key_id: &str) -> RegistryResult<ImportSummary>;

    /// Certify `key_id`, optionally with an explicit signing key.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    fn sign_key(&self, key_id: &str, signing_key: Option<&str>) -> RegistryResult<SignOutcome>;
}
