//! Bridge from `sealpost_config::Config` to domain types.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sealpost_config::{Config, ProfileSection};
use sealpost_core::{ConnectionBroker, KeyRef, NetCapability, ProfileRecord, ProfileStore};
use sealpost_doctor::HealthPolicy;
use sealpost_gnupg::GnuPgOptions;
use sealpost_telemetry::{LogConfig, LogFormat};

use crate::fetch::HttpKeyFetcher;
use crate::parse_cache::FsParseCache;

/// Profiles read from `[[profiles]]` tables.
#[derive(Debug, Clone, Default)]
pub struct ConfigProfileStore {
    records: Vec<ProfileRecord>,
}

impl ConfigProfileStore {
    /// Convert every configured profile.
    #[must_use]
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            records: cfg.profiles.iter().map(to_profile_record).collect(),
        }
    }
}

impl ProfileStore for ConfigProfileStore {
    fn profiles(&self) -> Vec<ProfileRecord> {
        self.records.clone()
    }
}

/// Convert one profile section; the id defaults to the email address.
#[must_use]
pub fn to_profile_record(section: &ProfileSection) -> ProfileRecord {
    ProfileRecord {
        id: section
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| section.email.clone()),
        name: section.name.clone(),
        email: section.email.clone(),
        keys: section.keys.iter().map(KeyRef::new).collect(),
        signing_key: section.signing_key.clone(),
        crypto_format: section.crypto_format.clone(),
    }
}

/// Convert config to [`LogConfig`]; `verbose` forces `debug`.
#[must_use]
pub fn to_log_config(cfg: &Config, verbose: bool) -> LogConfig {
    let format = cfg.logging.format.parse().unwrap_or(LogFormat::Compact);
    let level = if verbose { "debug" } else { cfg.logging.level.as_str() };

    let mut log_config = LogConfig::new(level).with_format(format);
    if let Some(dir) = &cfg.logging.file_dir {
        log_config = log_config.with_file_logging(dir);
    }
    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }
    log_config
}

/// Convert config to [`GnuPgOptions`].
#[must_use]
pub fn to_gnupg_options(cfg: &Config) -> GnuPgOptions {
    GnuPgOptions {
        binary: cfg.gnupg.binary.clone(),
        homedir: cfg.gnupg.homedir.clone(),
        keyserver: cfg.gnupg.keyserver.clone(),
        timeout: Duration::from_secs(cfg.gnupg.timeout_secs),
    }
}

/// Convert config to the key health thresholds.
#[must_use]
pub fn to_health_policy(cfg: &Config) -> HealthPolicy {
    HealthPolicy {
        min_key_bits: cfg.doctor.min_key_bits,
        expiry_warning_days: cfg.doctor.expiry_warning_days,
    }
}

/// Build the connection broker from `[network]`.
#[must_use]
pub fn to_broker(cfg: &Config) -> ConnectionBroker {
    if cfg.network.allow_outgoing_http {
        ConnectionBroker::new([NetCapability::OutgoingHttp])
    } else {
        ConnectionBroker::offline()
    }
}

/// Build the URL fetcher from `[network]`.
#[must_use]
pub fn to_fetcher(cfg: &Config) -> HttpKeyFetcher {
    HttpKeyFetcher::new(
        Arc::new(to_broker(cfg)),
        Duration::from_secs(cfg.network.fetch_timeout_secs),
        cfg.network.max_fetch_bytes,
    )
}

/// The parse cache: `[cache] dir`, or `<home>/cache`.
#[must_use]
pub fn to_parse_cache(cfg: &Config, home: &Path) -> FsParseCache {
    FsParseCache::new(cfg.cache.dir.clone().unwrap_or_else(|| home.join("cache")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: Option<&str>) -> ProfileSection {
        ProfileSection {
            id: id.map(str::to_owned),
            name: "Alice".to_owned(),
            email: "alice@example.org".to_owned(),
            keys: vec!["data:x,ABCD1234".to_owned()],
            signing_key: None,
            crypto_format: "openpgp_header:SE".to_owned(),
        }
    }

    #[test]
    fn test_profile_id_defaults_to_email() {
        assert_eq!(to_profile_record(&section(None)).id, "alice@example.org");
        assert_eq!(to_profile_record(&section(Some(" "))).id, "alice@example.org");
        assert_eq!(to_profile_record(&section(Some("p1"))).id, "p1");
    }

    #[test]
    fn test_store_lookup_uses_first_key() {
        let mut cfg = Config::default();
        cfg.profiles.push(section(None));
        let store = ConfigProfileStore::from_config(&cfg);

        let profile = store.profile("ALICE@example.org").unwrap();
        assert_eq!(profile.key_id.as_deref(), Some("ABCD1234"));
        assert_eq!(profile.crypto_format, "openpgp_header:SE");
        assert!(store.profile("bob@example.org").is_none());
    }

    #[test]
    fn test_gnupg_options() {
        let mut cfg = Config::default();
        cfg.gnupg.keyserver = Some("hkps://keys.openpgp.org".to_owned());
        cfg.gnupg.timeout_secs = 5;
        let opts = to_gnupg_options(&cfg);
        assert_eq!(opts.binary, "gpg");
        assert_eq!(opts.keyserver.as_deref(), Some("hkps://keys.openpgp.org"));
        assert_eq!(opts.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_broker_follows_network_policy() {
        let mut cfg = Config::default();
        assert!(to_broker(&cfg).acquire(&[NetCapability::OutgoingHttp]).is_ok());
        cfg.network.allow_outgoing_http = false;
        assert!(to_broker(&cfg).acquire(&[NetCapability::OutgoingHttp]).is_err());
    }

    #[test]
    fn test_cache_dir_default() {
        let cfg = Config::default();
        let cache = to_parse_cache(&cfg, Path::new("/home/alice/.sealpost"));
        assert_eq!(cache.dir(), Path::new("/home/alice/.sealpost/cache"));
    }

    #[test]
    fn test_health_policy() {
        let mut cfg = Config::default();
        cfg.doctor.min_key_bits = 3072;
        assert_eq!(to_health_policy(&cfg).min_key_bits, 3072);
        assert_eq!(to_health_policy(&cfg).expiry_warning_days, 14);
    }
}
