//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges. Profile directives with unknown header codes are only
//! warned about: the resolver treats them as "no header".

use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Preference keywords accepted for `prefs.openpgp_header`.
pub const PREFERENCE_KEYWORDS: &[&str] = &["sign", "encrypt", "signencrypt", "unprotected"];

/// Header codes accepted in an `openpgp_header:<code>` directive segment.
pub const HEADER_CODES: &[&str] = &["N", "E", "S", "ES", "SE", "CFG"];

/// Smallest `doctor.min_key_bits` we accept.
const MIN_KEY_BITS_FLOOR: u32 = 1024;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_prefs(config)?;
    validate_doctor(config)?;
    validate_timeouts(config)?;
    validate_logging(config)?;
    validate_profiles(config)?;
    Ok(())
}

fn validate_prefs(config: &Config) -> ConfigResult<()> {
    let Some(keyword) = config.prefs.openpgp_header() else {
        return Ok(());
    };
    if !PREFERENCE_KEYWORDS.contains(&keyword.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError {
            field: "prefs.openpgp_header".to_owned(),
            message: format!(
                "unknown preference '{keyword}'; expected one of: {}",
                PREFERENCE_KEYWORDS.join(", ")
            ),
        });
    }
    Ok(())
}

fn validate_doctor(config: &Config) -> ConfigResult<()> {
    if config.doctor.min_key_bits < MIN_KEY_BITS_FLOOR {
        return Err(ConfigError::ValidationError {
            field: "doctor.min_key_bits".to_owned(),
            message: format!(
                "min_key_bits ({}) must be at least {MIN_KEY_BITS_FLOOR}",
                config.doctor.min_key_bits
            ),
        });
    }
    Ok(())
}

fn validate_timeouts(config: &Config) -> ConfigResult<()> {
    let checks = [
        ("gnupg.timeout_secs", config.gnupg.timeout_secs),
        ("network.fetch_timeout_secs", config.network.fetch_timeout_secs),
        ("network.max_fetch_bytes", config.network.max_fetch_bytes),
    ];
    for (field, value) in checks {
        if value == 0 {
            return Err(ConfigError::ValidationError {
                field: field.to_owned(),
                message: "must be greater than zero".to_owned(),
            });
        }
    }
    if config.gnupg.binary.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "gnupg.binary".to_owned(),
            message: "binary must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_ascii_lowercase().as_str(),
        "error" | "warn" | "info" | "debug" | "trace"
    ) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unknown level '{}'; expected one of: error, warn, info, debug, trace",
                l.level
            ),
        });
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unknown format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        });
    }

    Ok(())
}

fn validate_profiles(config: &Config) -> ConfigResult<()> {
    for (idx, profile) in config.profiles.iter().enumerate() {
        if profile.email.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("profiles[{idx}].email"),
                message: "every profile needs an email address".to_owned(),
            });
        }

        let code = profile
            .crypto_format
            .split('+')
            .find_map(|segment| segment.trim().strip_prefix("openpgp_header:"));
        if let Some(code) = code
            && !HEADER_CODES.contains(&code.trim().to_ascii_uppercase().as_str())
        {
            warn!(
                profile = %profile.email,
                code,
                "unknown openpgp_header code, no header will be sent for this profile"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProfileSection;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_preference_keyword_case_insensitive() {
        let mut config = Config::default();
        config.prefs.openpgp_header = Some("SignEncrypt".to_owned());
        assert!(validate(&config).is_ok());

        config.prefs.openpgp_header = Some("always".to_owned());
        assert!(validate(&config).is_err());

        config.prefs.openpgp_header = Some("   ".to_owned());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_small_min_key_bits_rejected() {
        let mut config = Config::default();
        config.doctor.min_key_bits = 512;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("doctor.min_key_bits"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.network.fetch_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_header_code_only_warns() {
        let mut config = Config::default();
        config.profiles.push(ProfileSection {
            email: "alice@example.org".to_owned(),
            crypto_format: "openpgp_header:XYZ+pgpmime".to_owned(),
            ..ProfileSection::default()
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_profile_without_email_rejected() {
        let mut config = Config::default();
        config.profiles.push(ProfileSection::default());
        assert!(validate(&config).is_err());
    }
}
