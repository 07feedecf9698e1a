//! Configuration types for Sealpost.
//!
//! All types in this module are self-contained with no dependencies on other
//! internal sealpost crates. Profiles are mirrored here and converted to
//! domain types at the CLI boundary. Every struct implements [`Default`] so
//! that a bare `[section]` header in TOML produces a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outgoing-mail preferences.
    pub prefs: PrefsSection,
    /// Default key selection.
    pub crypto: CryptoSection,
    /// System-wide switches.
    pub sys: SysSection,
    /// How to drive the GnuPG binary.
    pub gnupg: GnupgSection,
    /// Outbound network policy for key fetches.
    pub network: NetworkSection,
    /// Key health thresholds.
    pub doctor: DoctorSection,
    /// Location of the shared parse cache.
    pub cache: CacheSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
    /// Identity profiles.
    pub profiles: Vec<ProfileSection>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Outgoing-mail preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefsSection {
    /// Global OpenPGP header preference keyword (`sign`, `encrypt`,
    /// `signencrypt`, `unprotected`). Unset means no header by default.
    pub openpgp_header: Option<String>,
}

impl PrefsSection {
    /// The global preference, if set to a non-blank value.
    #[must_use]
    pub fn openpgp_header(&self) -> Option<&str> {
        self.openpgp_header
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Default key selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoSection {
    /// Fingerprint (or fingerprint suffix) of the default signing and
    /// encryption key.
    pub default_key: Option<String>,
}

/// System-wide switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SysSection {
    /// Refuse every keyring-mutating command.
    pub lockdown: bool,
}

/// How to drive the GnuPG binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GnupgSection {
    /// Binary name or path.
    pub binary: String,
    /// Alternate `--homedir`.
    pub homedir: Option<PathBuf>,
    /// Keyserver for searches and receives.
    pub keyserver: Option<String>,
    /// Upper bound on a single invocation, in seconds.
    pub timeout_secs: u64,
}

impl Default for GnupgSection {
    fn default() -> Self {
        Self {
            binary: "gpg".to_owned(),
            homedir: None,
            keyserver: None,
            timeout_secs: 60,
        }
    }
}

/// Outbound network policy for key fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    /// Permit fetching key material over HTTP(S).
    pub allow_outgoing_http: bool,
    /// Timeout for a single fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Largest accepted response body, in bytes.
    pub max_fetch_bytes: u64,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            allow_outgoing_http: true,
            fetch_timeout_secs: 30,
            max_fetch_bytes: 1_048_576,
        }
    }
}

/// Key health thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorSection {
    /// Smallest acceptable key size in bits.
    pub min_key_bits: u32,
    /// Keys expiring within this many days are flagged.
    pub expiry_warning_days: u32,
}

impl Default for DoctorSection {
    fn default() -> Self {
        Self {
            min_key_bits: 2048,
            expiry_warning_days: 14,
        }
    }
}

/// Location of the shared parse cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Cache directory; defaults to `~/.sealpost/cache`.
    pub dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Extra `target=level` directives.
    pub directives: Vec<String>,
    /// Write logs to daily-rotated files in this directory instead of stderr.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            file_dir: None,
        }
    }
}

/// One identity profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    /// Stable id; defaults to the email address.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Key references (`<anything>,<FINGERPRINT>` or a bare fingerprint).
    pub keys: Vec<String>,
    /// Explicit signing key id.
    pub signing_key: Option<String>,
    /// Crypto-format directive, e.g. `openpgp_header:SE+pgpmime`.
    pub crypto_format: String,
}
