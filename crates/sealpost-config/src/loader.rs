//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge `/etc/sealpost/config.toml` (system)
//! 3. Merge `~/.sealpost/config.toml` (user, or `$SEALPOST_HOME/config.toml`)
//! 4. Merge the explicit `--config` file, which must exist
//! 5. Apply env var fallbacks for fields no file set
//! 6. Deserialize merged tree → `Config`
//! 7. Validate

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, merge_layer, record_leaves};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Name of the per-user directory under the home directory.
pub const HOME_DIR_NAME: &str = ".sealpost";

/// A loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Which layer set each field.
    pub field_sources: FieldSources,
    /// Files that were merged, in order.
    pub loaded_files: Vec<String>,
    /// The per-user sealpost directory.
    pub home: PathBuf,
}

/// Load the configuration with layered file precedence.
///
/// `explicit` is a file named on the command line; `home_override` replaces
/// the per-user sealpost directory (used by tests and `SEALPOST_HOME`).
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, an explicit
/// file is missing, or the merged configuration fails validation.
pub fn load(explicit: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    let env_vars = collect_env_vars();

    let home = match (home_override, env_vars.get("SEALPOST_HOME")) {
        (Some(h), _) => h.to_path_buf(),
        (None, Some(h)) if !h.trim().is_empty() => PathBuf::from(h),
        (None, _) => home_directory()?.join(HOME_DIR_NAME),
    };

    // 1. Embedded defaults.
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut field_sources = FieldSources::new();
    record_leaves(&merged, "", &ConfigLayer::Defaults, &mut field_sources);
    let mut loaded_files = Vec::new();

    // 2–3. System and user layers, skipped when absent.
    let layers = [
        (PathBuf::from("/etc/sealpost/config.toml"), ConfigLayer::System),
        (home.join("config.toml"), ConfigLayer::User),
    ];
    for (path, layer) in layers {
        if let Some(overlay) = try_load_file(&path)? {
            merge_layer(&mut merged, &overlay, "", &layer, &mut field_sources);
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), %layer, "loaded config layer");
        }
    }

    // 4. Explicit file.
    if let Some(path) = explicit {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        merge_layer(
            &mut merged,
            &overlay,
            "",
            &ConfigLayer::Explicit,
            &mut field_sources,
        );
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded explicit config");
    }

    // 5. Env var fallbacks.
    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, &env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    // 6. Deserialize.
    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    // 7. Validate.
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
        home,
    })
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Uses a single read operation to avoid TOCTOU races (no separate
/// exists/metadata checks before reading).
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config.gnupg.binary, "gpg");
        assert_eq!(config.doctor.min_key_bits, 2048);
        assert_eq!(config.doctor.expiry_warning_days, 14);
        assert!(!config.sys.lockdown);
        assert!(config.prefs.openpgp_header().is_none());
        assert!(config.profiles.is_empty());
        assert!(validate::validate(&config).is_ok());
    }

    #[test]
    fn test_load_with_user_and_explicit_layers() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(
            home.path().join("config.toml"),
            r#"
            [prefs]
            openpgp_header = "sign"

            [crypto]
            default_key = "DEADBEEF"
            "#,
        )
        .unwrap();

        let explicit = home.path().join("override.toml");
        std::fs::write(
            &explicit,
            r#"
            [prefs]
            openpgp_header = "signencrypt"

            [[profiles]]
            name = "Alice"
            email = "alice@example.org"
            keys = ["data:x,0123456789ABCDEF"]
            crypto_format = "openpgp_header:SE"
            "#,
        )
        .unwrap();

        let resolved = load(Some(&explicit), Some(home.path())).unwrap();
        let config = resolved.config;

        assert_eq!(config.prefs.openpgp_header(), Some("signencrypt"));
        assert_eq!(config.crypto.default_key.as_deref(), Some("DEADBEEF"));
        assert_eq!(config.profiles.len(), 1);
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.field_sources.get("crypto.default_key"),
            Some(&ConfigLayer::User)
        );
        assert_eq!(
            resolved.field_sources.get("prefs.openpgp_header"),
            Some(&ConfigLayer::Explicit)
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        let result = load(
            Some(Path::new("/nonexistent/sealpost.toml")),
            Some(home.path()),
        );
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_invalid_preference_rejected() {
        let home = tempfile::tempdir().unwrap();
        let path = home.path().join("bad.toml");
        std::fs::write(&path, "[prefs]\nopenpgp_header = \"loudly\"\n").unwrap();

        let result = load(Some(&path), Some(home.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(
            matches!(result, Err(ConfigError::ValidationError { .. })),
            "Expected ValidationError for oversized config, got: {result:?}"
        );
    }
}
