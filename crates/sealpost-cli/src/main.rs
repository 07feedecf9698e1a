//! Sealpost CLI - OpenPGP key management, key health checks and outgoing
//! message previews, driving the local `gpg` installation.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sealpost_cli::config_bridge::{
    to_fetcher, to_gnupg_options, to_health_policy, to_log_config, to_parse_cache,
};
use sealpost_cli::{
    CommandOutcome, ConfigProfileStore, KeyCommands, OutputFormat, PreviewRequest, check_keys,
    preview,
};
use sealpost_config::Config;
use sealpost_core::{KeyRegistry, ProfileStore};
use sealpost_doctor::{DiagnoseOptions, Doctor};
use sealpost_gnupg::GnuPg;
use serde_json::Value;
use tracing::debug;

/// Sealpost - OpenPGP policy and key health for outgoing mail
#[derive(Parser)]
#[command(name = "sealpost")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: text (default) or json
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Path to an extra configuration file
    #[arg(short, long, global = true, env = "SEALPOST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the keyserver
    SearchKey {
        /// Search terms (joined with spaces)
        terms: Vec<String>,
    },

    /// Fetch keys from the keyserver
    ReceiveKey {
        /// Key ids to fetch
        key_ids: Vec<String>,
    },

    /// Import keys from files, URLs or inline data
    ImportKey {
        /// Key files, or URLs (anything containing `://`)
        sources: Vec<String>,
        /// ASCII-armored key material
        #[arg(long, allow_hyphen_values = true)]
        data: Vec<String>,
    },

    /// Certify a key
    SignKey {
        /// The key to sign
        key_id: Option<String>,
        /// The key to sign with
        signing_key: Option<String>,
    },

    /// List keys bound to an e-mail address
    ListKeys {
        /// E-mail address
        address: Option<String>,
    },

    /// List secret keys
    ListSecretKeys,

    /// Sanity check your keys and profiles
    CheckKeys {
        /// Check every key a profile lists, not only the first
        #[arg(long)]
        all_keys: bool,
        /// Print only `OK` when everything passes
        #[arg(long)]
        quiet: bool,
    },

    /// Show how an outgoing message would be protected, without sending it
    Preview {
        /// Sender address
        #[arg(long)]
        from: String,
        /// Recipient addresses
        #[arg(long)]
        to: Vec<String>,
        /// Crypto policy, e.g. `openpgp-sign-encrypt`
        #[arg(long, default_value = "none")]
        policy: String,
        /// Attach the sender's public keys
        #[arg(long)]
        attach_key: bool,
        /// Prefer inline PGP over PGP/MIME
        #[arg(long)]
        inline: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::SearchKey { .. } => "search-key",
            Self::ReceiveKey { .. } => "receive-key",
            Self::ImportKey { .. } => "import-key",
            Self::SignKey { .. } => "sign-key",
            Self::ListKeys { .. } => "list-keys",
            Self::ListSecretKeys => "list-secret-keys",
            Self::CheckKeys { .. } => "check-keys",
            Self::Preview { .. } => "preview",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::from(2)
        },
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let resolved = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let cfg = &resolved.config;

    if let Err(e) = sealpost_telemetry::setup_logging(&to_log_config(cfg, cli.verbose)) {
        eprintln!("Failed to initialize logging: {e}");
    }
    debug!(files = ?resolved.loaded_files, home = %resolved.home.display(), "configuration loaded");

    let registry: Arc<dyn KeyRegistry> = Arc::new(GnuPg::new(to_gnupg_options(cfg)));
    let profiles: Arc<dyn ProfileStore> = Arc::new(ConfigProfileStore::from_config(cfg));
    let keys = KeyCommands::new(
        Arc::clone(&registry),
        Arc::new(to_parse_cache(cfg, &resolved.home)),
        Arc::new(to_fetcher(cfg)),
    )
    .with_lockdown(cfg.sys.lockdown);

    let name = cli.command.name();
    let result = match cli.command {
        Commands::SearchKey { terms } => keys.search_key(&terms),
        Commands::ReceiveKey { key_ids } => keys.receive_key(&key_ids),
        Commands::ImportKey { sources, data } => keys.import_key(&sources, &data),
        Commands::SignKey {
            key_id,
            signing_key,
        } => keys.sign_key(key_id.as_deref(), signing_key.as_deref()),
        Commands::ListKeys { address } => keys.list_keys(address.as_deref()),
        Commands::ListSecretKeys => keys.list_secret_keys(),
        Commands::CheckKeys { all_keys, quiet } => {
            let doctor = Doctor::new(registry, profiles)
                .with_default_key(cfg.crypto.default_key.clone())
                .with_policy(to_health_policy(cfg));
            check_keys(&doctor, DiagnoseOptions { all_keys, quiet })
        },
        Commands::Preview {
            from,
            to,
            policy,
            attach_key,
            inline,
        } => preview(
            registry,
            profiles,
            cfg.prefs.openpgp_header().map(str::to_owned),
            &PreviewRequest {
                from,
                to,
                policy,
                attach_key,
                prefer_inline: inline,
            },
        ),
    };

    let outcome = result.unwrap_or_else(|e| CommandOutcome::error(name, e.to_string(), Value::Null));
    println!("{}", outcome.render(cli.format));
    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_key_arguments() {
        let cli = Cli::try_parse_from([
            "sealpost",
            "import-key",
            "alice.asc",
            "https://keys.example.org/bob.asc",
            "--data",
            "-----BEGIN PGP PUBLIC KEY BLOCK-----",
        ])
        .unwrap();
        match cli.command {
            Commands::ImportKey { sources, data } => {
                assert_eq!(sources, ["alice.asc", "https://keys.example.org/bob.asc"]);
                assert_eq!(data.len(), 1);
            },
            _ => panic!("expected import-key"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sealpost", "check-keys", "--all-keys", "--format", "json"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::CheckKeys {
                all_keys: true,
                quiet: false
            }
        ));
    }
}
