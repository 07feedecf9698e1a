//! Key commands: search, receive, import, sign and list.

use std::path::PathBuf;
use std::sync::Arc;

use sealpost_core::{
    CacheScope, ImportSummary, KeyInfo, KeyRegistry, ParseCache, RegistryResult, SearchHit,
};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::{CommandError, CommandResult};
use crate::fetch::KeyFetcher;
use crate::outcome::CommandOutcome;
use crate::theme::Theme;

/// Message returned by mutating commands while locked down.
pub const LOCKDOWN_MESSAGE: &str = "In lockdown, doing nothing.";

/// The key-management command layer.
///
/// Mutating commands (`receive-key`, `import-key`, `sign-key`) refuse to run
/// in lockdown and always invalidate the PGP/MIME parse cache once the
/// registry call has returned.
pub struct KeyCommands {
    registry: Arc<dyn KeyRegistry>,
    cache: Arc<dyn ParseCache>,
    fetcher: Arc<dyn KeyFetcher>,
    lockdown: bool,
}

impl KeyCommands {
    /// Create the command layer.
    #[must_use]
    pub fn new(
        registry: Arc<dyn KeyRegistry>,
        cache: Arc<dyn ParseCache>,
        fetcher: Arc<dyn KeyFetcher>,
    ) -> Self {
        Self {
            registry,
            cache,
            fetcher,
            lockdown: false,
        }
    }

    /// Refuse every mutating command.
    #[must_use]
    pub fn with_lockdown(mut self, lockdown: bool) -> Self {
        self.lockdown = lockdown;
        self
    }

    /// `search-key <terms>...`: search the keyserver.
    ///
    /// # Errors
    ///
    /// Fails without terms or when the search itself fails.
    pub fn search_key(&self, terms: &[String]) -> CommandResult<CommandOutcome> {
        let query = terms
            .iter()
            .flat_map(|t| t.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ");
        if query.is_empty() {
            return Err(CommandError::MissingArgument(
                "You must supply search terms".to_owned(),
            ));
        }

        let hits = self.registry.search_key(&query)?;
        info!(query = %query, hits = hits.len(), "keyserver search");
        Ok(CommandOutcome::success(
            "search-key",
            format!("Found {} keys", hits.len()),
            to_value(&hits),
        )
        .with_text(render_search(&hits)))
    }

    /// `receive-key <keyid>...`: fetch keys from the keyserver.
    ///
    /// # Errors
    ///
    /// Fails without key ids or when a receive fails.
    pub fn receive_key(&self, key_ids: &[String]) -> CommandResult<CommandOutcome> {
        if self.lockdown {
            return Ok(locked_down("receive-key"));
        }
        if key_ids.is_empty() {
            return Err(CommandError::MissingArgument(
                "You must supply a key id".to_owned(),
            ));
        }

        let received = self.finish_mutation(key_ids.iter().try_fold(
            ImportSummary::default(),
            |mut total, key_id| -> RegistryResult<ImportSummary> {
                total.absorb(self.registry.receive_key(key_id)?);
                Ok(total)
            },
        ))?;
        Ok(CommandOutcome::success(
            "receive-key",
            import_message("Received", key_ids.len(), &received),
            to_value(&received),
        ))
    }

    /// `import-key [<file|url>...] [--data <armor>...]`.
    ///
    /// Arguments containing `://` are fetched as URLs, the rest are read as
    /// files.
    ///
    /// # Errors
    ///
    /// Fails without any key source, when a source cannot be read or
    /// fetched, or when the import fails.
    pub fn import_key(&self, args: &[String], data: &[String]) -> CommandResult<CommandOutcome> {
        if self.lockdown {
            return Ok(locked_down("import-key"));
        }
        let (urls, files): (Vec<&String>, Vec<&String>) =
            args.iter().partition(|a| a.contains("://"));

        let mut blocks: Vec<String> = data.to_vec();
        for file in files {
            let path = PathBuf::from(file);
            let text = std::fs::read_to_string(&path)
                .map_err(|source| CommandError::ReadKeyFile { path, source })?;
            blocks.push(text);
        }
        for url in urls {
            let body = self.fetcher.fetch(url)?;
            blocks.push(String::from_utf8_lossy(&body).into_owned());
        }
        if blocks.is_empty() {
            return Err(CommandError::MissingArgument(
                "You must supply a key file, URL or --data".to_owned(),
            ));
        }

        let summary = self.finish_mutation(self.registry.import_keys(&blocks.join("\n")))?;
        for fpr in summary.changed_fingerprints() {
            info!(fingerprint = %fpr, "key imported or updated");
        }
        Ok(CommandOutcome::success(
            "import-key",
            import_message("Imported", blocks.len(), &summary),
            to_value(&summary),
        ))
    }

    /// `sign-key <keyid> [<signingkey>]`.
    ///
    /// # Errors
    ///
    /// Fails without a key id or when signing fails.
    pub fn sign_key(
        &self,
        key_id: Option<&str>,
        signing_key: Option<&str>,
    ) -> CommandResult<CommandOutcome> {
        if self.lockdown {
            return Ok(locked_down("sign-key"));
        }
        let Some(key_id) = key_id.map(str::trim).filter(|k| !k.is_empty()) else {
            return Err(CommandError::MissingArgument(
                "You must supply a keyid".to_owned(),
            ));
        };
        let signing_key = signing_key.map(str::trim).filter(|k| !k.is_empty());

        let signed = self.finish_mutation(self.registry.sign_key(key_id, signing_key))?;
        let message = match &signed.signing_key {
            Some(signer) => format!("Signed {} with {signer}", signed.key_id),
            None => format!("Signed {} with the default key", signed.key_id),
        };
        Ok(CommandOutcome::success("sign-key", message, to_value(&signed)))
    }

    /// `list-keys <address>`: keys bound to an e-mail address.
    ///
    /// # Errors
    ///
    /// Fails without an address or when the listing fails.
    pub fn list_keys(&self, address: Option<&str>) -> CommandResult<CommandOutcome> {
        let Some(address) = address.map(str::trim).filter(|a| !a.is_empty()) else {
            return Err(CommandError::MissingArgument(
                "Must supply e-mail address".to_owned(),
            ));
        };
        let keys = self.registry.address_to_keys(address)?;
        let message = "Searched for keys for e-mail address";
        Ok(CommandOutcome::success("list-keys", message, to_value(&keys))
            .with_text(render_keys(message, &keys)))
    }

    /// `list-secret-keys`.
    ///
    /// # Errors
    ///
    /// Fails when the listing fails.
    pub fn list_secret_keys(&self) -> CommandResult<CommandOutcome> {
        let keys = self.registry.list_secret_keys()?;
        let message = "Searched for secret keys";
        Ok(CommandOutcome::success("list-secret-keys", message, to_value(&keys))
            .with_text(render_keys(message, &keys)))
    }

    /// Invalidate cached PGP/MIME evaluations after a keyring mutation.
    ///
    /// Runs whether or not the mutation succeeded, before its result is
    /// handed back.
    pub fn finish_mutation<T>(&self, result: RegistryResult<T>) -> RegistryResult<T> {
        self.cache.invalidate(CacheScope::PgpMime);
        if let Err(e) = &result {
            warn!(error = %e, "keyring mutation failed");
        }
        result
    }
}

fn locked_down(command: &'static str) -> CommandOutcome {
    warn!(command, "refusing to mutate keyring in lockdown");
    CommandOutcome::error(command, LOCKDOWN_MESSAGE, Value::Null)
}

fn import_message(verb: &str, sources: usize, summary: &ImportSummary) -> String {
    format!(
        "{verb} {sources} key sources: {} new, {} updated, {} unchanged",
        summary.imported.len(),
        summary.updated.len(),
        summary.unchanged
    )
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

/// `<keyid>: <name> <email>` per user id, or `No results`.
fn render_search(hits: &[SearchHit]) -> String {
    let lines: Vec<String> = hits
        .iter()
        .flat_map(|hit| {
            hit.uids
                .iter()
                .map(move |uid| format!("{}: {} <{}>", hit.key_id, uid.name, uid.email))
        })
        .collect();
    if lines.is_empty() {
        "No results".to_owned()
    } else {
        lines.join("\n")
    }
}

fn render_keys(message: &str, keys: &[KeyInfo]) -> String {
    if keys.is_empty() {
        return format!("{message}: none found");
    }
    let mut out = vec![Theme::header(message)];
    for key in keys {
        let mut flags = Vec::new();
        if key.disabled {
            flags.push("disabled".to_owned());
        }
        if key.revoked {
            flags.push("revoked".to_owned());
        }
        if let Some(date) = key.expires {
            flags.push(format!("expires {date}"));
        }
        out.push(format!(
            "  {}  {} bits  [{}]{}",
            Theme::fingerprint(key.fingerprint.as_str()),
            key.key_size,
            capability_letters(key),
            if flags.is_empty() {
                String::new()
            } else {
                Theme::dimmed(&format!("  ({})", flags.join(", ")))
            }
        ));
        for uid in &key.uids {
            out.push(format!("      {} <{}>", uid.name, uid.email));
        }
    }
    out.join("\n")
}

fn capability_letters(key: &KeyInfo) -> String {
    let caps = key.capabilities;
    [
        (caps.sign, 'S'),
        (caps.encrypt, 'E'),
        (caps.certify, 'C'),
        (caps.authenticate, 'A'),
    ]
    .into_iter()
    .filter(|(on, _)| *on)
    .map(|(_, c)| c)
    .collect()
}
