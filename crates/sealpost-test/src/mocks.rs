//! Mock collaborators for testing.
//!
//! All mocks are cheap to clone and share their recorded state, so a test
//! can hand a clone to the code under test and inspect the original.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use sealpost_core::{
    CacheScope, ImportSummary, KeyInfo, KeyRegistry, ParseCache, ProfileRecord, ProfileStore,
    RegistryError, RegistryResult, SearchHit, SignOutcome,
};
use sealpost_outgoing::{MessageWrapper, OutgoingMessage, WrapError, WrapRequest, WrapperKind};

/// In-memory [`KeyRegistry`].
///
/// Every call is recorded as `operation[:arg[:arg]]`.
#[derive(Debug, Clone, Default)]
pub struct MockKeyRegistry {
    secret_keys: Vec<KeyInfo>,
    public_keys: Vec<KeyInfo>,
    exports: HashMap<String, Vec<u8>>,
    search_hits: Vec<SearchHit>,
    import_results: Arc<Mutex<VecDeque<ImportSummary>>>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockKeyRegistry {
    /// An empty keyring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret key (also visible as a public key).
    #[must_use]
    pub fn with_secret_key(mut self, key: KeyInfo) -> Self {
        self.public_keys.push(key.clone());
        self.secret_keys.push(key);
        self
    }

    /// Add a public-only key.
    #[must_use]
    pub fn with_public_key(mut self, key: KeyInfo) -> Self {
        self.public_keys.push(key);
        self
    }

    /// Register exported material for `key_id`.
    #[must_use]
    pub fn with_export(mut self, key_id: &str, data: &[u8]) -> Self {
        self.exports.insert(key_id.to_owned(), data.to_vec());
        self
    }

    /// Results returned by keyserver searches.
    #[must_use]
    pub fn with_search_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.search_hits = hits;
        self
    }

    /// Queue a summary for the next import or receive.
    #[must_use]
    pub fn with_import_result(self, summary: ImportSummary) -> Self {
        if let Ok(mut guard) = self.import_results.lock() {
            guard.push_back(summary);
        }
        self
    }

    /// Make every call fail with a tool error.
    #[must_use]
    pub fn failing(mut self, stderr: &str) -> Self {
        self.failure = Some(stderr.to_owned());
        self
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, operation: &str, args: &[&str]) -> RegistryResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            let mut entry = operation.to_owned();
            for arg in args {
                entry.push(':');
                entry.push_str(arg);
            }
            calls.push(entry);
        }
        match &self.failure {
            Some(stderr) => Err(RegistryError::ToolFailed {
                operation: operation.to_owned(),
                code: Some(2),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }

    fn next_import(&self) -> ImportSummary {
        self.import_results
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_default()
    }
}

impl KeyRegistry for MockKeyRegistry {
    fn list_secret_keys(&self) -> RegistryResult<Vec<KeyInfo>> {
        self.record("list_secret_keys", &[])?;
        Ok(self.secret_keys.clone())
    }

    fn address_to_keys(&self, address: &str) -> RegistryResult<Vec<KeyInfo>> {
        self.record("address_to_keys", &[address])?;
        Ok(self
            .public_keys
            .iter()
            .filter(|k| k.has_email(address))
            .cloned()
            .collect())
    }

    fn import_keys(&self, armored: &str) -> RegistryResult<ImportSummary> {
        self.record("import_keys", &[&armored.len().to_string()])?;
        Ok(self.next_import())
    }

    fn public_key(&self, key_id: &str) -> RegistryResult<Vec<u8>> {
        self.record("public_key", &[key_id])?;
        self.exports
            .get(key_id)
            .cloned()
            .ok_or_else(|| RegistryError::KeyNotFound(key_id.to_owned()))
    }

    fn search_key(&self, query: &str) -> RegistryResult<Vec<SearchHit>> {
        self.record("search_key", &[query])?;
        Ok(self.search_hits.clone())
    }

    fn receive_key(&self, key_id: &str) -> RegistryResult<ImportSummary> {
        self.record("receive_key", &[key_id])?;
        Ok(self.next_import())
    }

    fn sign_key(&self, key_id: &str, signing_key: Option<&str>) -> RegistryResult<SignOutcome> {
        self.record("sign_key", &[key_id, signing_key.unwrap_or("-")])?;
        Ok(SignOutcome {
            key_id: key_id.to_owned(),
            signing_key: signing_key.map(str::to_owned),
        })
    }
}

/// Fixed list of profiles.
#[derive(Debug, Clone, Default)]
pub struct MockProfileStore {
    profiles: Vec<ProfileRecord>,
}

impl MockProfileStore {
    /// No profiles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile.
    #[must_use]
    pub fn with_profile(mut self, profile: ProfileRecord) -> Self {
        self.profiles.push(profile);
        self
    }
}

impl ProfileStore for MockProfileStore {
    fn profiles(&self) -> Vec<ProfileRecord> {
        self.profiles.clone()
    }
}

/// A wrap performed by [`RecordingWrapper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapCall {
    /// Wrapper kind requested.
    pub kind: WrapperKind,
    /// Sender passed in.
    pub sender: String,
    /// Recipients passed in.
    pub recipients: Vec<String>,
    /// Inline preference passed in.
    pub prefer_inline: bool,
}

/// [`MessageWrapper`] that records each request.
///
/// The wrapped message is the cleaned input with an `X-Wrapped: <kind>`
/// header.
#[derive(Debug, Clone, Default)]
pub struct RecordingWrapper {
    calls: Arc<Mutex<Vec<WrapCall>>>,
    failure: Option<String>,
}

impl RecordingWrapper {
    /// A wrapper that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A wrapper that always fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_owned()),
            ..Self::default()
        }
    }

    /// Wraps performed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<WrapCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl MessageWrapper for RecordingWrapper {
    fn wrap(
        &self,
        request: &WrapRequest<'_>,
        message: OutgoingMessage,
    ) -> Result<OutgoingMessage, WrapError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(WrapCall {
                kind: request.kind,
                sender: request.sender.to_owned(),
                recipients: request.recipients.to_vec(),
                prefer_inline: request.prefer_inline,
            });
        }
        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        let mut wrapped = (request.cleaner)(message);
        wrapped.set_header("X-Wrapped", request.kind.to_string());
        Ok(wrapped)
    }
}

/// [`ParseCache`] that records every invalidation.
#[derive(Debug, Clone, Default)]
pub struct RecordingParseCache {
    scopes: Arc<Mutex<Vec<CacheScope>>>,
}

impl RecordingParseCache {
    /// A fresh recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scopes invalidated so far.
    #[must_use]
    pub fn invalidations(&self) -> Vec<CacheScope> {
        self.scopes.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ParseCache for RecordingParseCache {
    fn invalidate(&self, scope: CacheScope) {
        if let Ok(mut scopes) = self.scopes.lock() {
            scopes.push(scope);
        }
    }
}
