//! Sealpost GnuPG - a [`KeyRegistry`] backed by the `gpg` binary.
//!
//! Every call is a single blocking `gpg --batch --no-tty` invocation using
//! machine-readable output (`--with-colons`, `--status-fd`). Listings are
//! validated into [`KeyInfo`] at this boundary.
//!
//! # Example
//!
//! ```rust,no_run
//! use sealpost_core::KeyRegistry;
//! use sealpost_gnupg::{GnuPg, GnuPgOptions};
//!
//! let gpg = GnuPg::new(GnuPgOptions::default());
//! for key in gpg.list_secret_keys().unwrap() {
//!     println!("{} {} bits", key.fingerprint, key.key_size);
//! }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod colons;
mod runner;
mod search;
mod status;

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use sealpost_core::{
    ImportSummary, KeyInfo, KeyRegistry, RegistryError, RegistryResult, SearchHit, SignOutcome,
};
use tracing::{debug, info};

use crate::runner::ToolOutput;

/// How to invoke GnuPG.
#[derive(Debug, Clone)]
pub struct GnuPgOptions {
    /// Binary name or path.
    pub binary: String,
    /// Alternate `--homedir`.
    pub homedir: Option<PathBuf>,
    /// Keyserver for searches and receives.
    pub keyserver: Option<String>,
    /// Upper bound on a single invocation.
    pub timeout: Duration,
}

impl Default for GnuPgOptions {
    fn default() -> Self {
        Self {
            binary: "gpg".to_owned(),
            homedir: None,
            keyserver: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Key registry driving the `gpg` binary.
#[derive(Debug, Clone)]
pub struct GnuPg {
    options: GnuPgOptions,
}

impl GnuPg {
    /// Create a registry with the given options.
    #[must_use]
    pub fn new(options: GnuPgOptions) -> Self {
        Self { options }
    }

    fn command_line(&self, keyserver: bool, args: &[&str], operands: &[&str]) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec!["--batch".into(), "--no-tty".into()];
        if let Some(home) = &self.options.homedir {
            argv.push("--homedir".into());
            argv.push(home.into());
        }
        if keyserver && let Some(server) = &self.options.keyserver {
            argv.push("--keyserver".into());
            argv.push(server.into());
        }
        argv.extend(args.iter().map(OsString::from));
        if !operands.is_empty() {
            argv.push("--".into());
            argv.extend(operands.iter().map(OsString::from));
        }
        argv
    }

    fn invoke(&self, argv: &[OsString], stdin: Option<&[u8]>) -> RegistryResult<ToolOutput> {
        runner::run(&self.options.binary, argv, stdin, self.options.timeout)
    }

    fn list(&self, secret: bool) -> RegistryResult<Vec<KeyInfo>> {
        let listing = if secret {
            "--list-secret-keys"
        } else {
            "--list-keys"
        };
        let argv = self.command_line(
            false,
            &[
                "--with-colons",
                "--fixed-list-mode",
                "--with-fingerprint",
                listing,
            ],
            &[],
        );
        let out = self.invoke(&argv, None)?.ok_or_failed(listing)?;
        Ok(colons::parse_key_listing(&out.stdout))
    }
}

impl KeyRegistry for GnuPg {
    fn list_secret_keys(&self) -> RegistryResult<Vec<KeyInfo>> {
        let keys = self.list(true)?;
        debug!(count = keys.len(), "listed secret keys");
        Ok(keys)
    }

    fn address_to_keys(&self, address: &str) -> RegistryResult<Vec<KeyInfo>> {
        let keys: Vec<KeyInfo> = self
            .list(false)?
            .into_iter()
            .filter(|k| k.has_email(address))
            .collect();
        debug!(address, count = keys.len(), "keys for address");
        Ok(keys)
    }

    fn import_keys(&self, armored: &str) -> RegistryResult<ImportSummary> {
        let argv = self.command_line(false, &["--status-fd", "1", "--import"], &[]);
        let out = self.invoke(&argv, Some(armored.as_bytes()))?;
        let summary = status::parse_import_status(&out.stdout);

        // gpg exits 2 when any key in the bundle failed; keep partial results.
        if !out.success && summary == ImportSummary::default() {
            out.ok_or_failed("import")?;
        }
        info!(
            imported = summary.imported.len(),
            updated = summary.updated.len(),
            unchanged = summary.unchanged,
            "import finished"
        );
        Ok(summary)
    }

    fn public_key(&self, key_id: &str) -> RegistryResult<Vec<u8>> {
        let argv = self.command_line(false, &["--armor", "--export"], &[key_id]);
        let out = self.invoke(&argv, None)?.ok_or_failed("export")?;
        if out.stdout.trim().is_empty() {
            return Err(RegistryError::KeyNotFound(key_id.to_owned()));
        }
        Ok(out.stdout.into_bytes())
    }

    fn search_key(&self, query: &str) -> RegistryResult<Vec<SearchHit>> {
        let argv = self.command_line(true, &["--with-colons", "--search-keys"], &[query]);
        let out = self.invoke(&argv, None)?;
        let hits = search::parse_search_listing(&out.stdout);
        if hits.is_empty() && !out.success {
            let stderr = out.stderr.to_ascii_lowercase();
            if stderr.contains("not found") || stderr.contains("no data") {
                return Ok(hits);
            }
            out.ok_or_failed("search")?;
        }
        debug!(query, count = hits.len(), "keyserver search");
        Ok(hits)
    }

    fn receive_key(&self, key_id: &str) -> RegistryResult<ImportSummary> {
        let argv = self.command_line(true, &["--status-fd", "1", "--recv-keys"], &[key_id]);
        let out = self.invoke(&argv, None)?.ok_or_failed("receive")?;
        let summary = status::parse_import_status(&out.stdout);
        info!(key_id, imported = summary.imported.len(), "received key");
        Ok(summary)
    }

    fn sign_key(&self, key_id: &str, signing_key: Option<&str>) -> RegistryResult<SignOutcome> {
        let mut args = vec!["--yes"];
        if let Some(signer) = signing_key {
            args.extend(["--local-user", signer]);
        }
        args.push("--quick-sign-key");
        let argv = self.command_line(false, &args, &[key_id]);
        self.invoke(&argv, None)?.ok_or_failed("sign")?;
        info!(key_id, signing_key, "signed key");
        Ok(SignOutcome {
            key_id: key_id.to_owned(),
            signing_key: signing_key.map(str::to_owned),
        })
    }
}
