//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields that
//! no config file set. Compiled-in defaults do yield to them.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `SEALPOST_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "SEALPOST_OPENPGP_HEADER",
        field_path: "prefs.openpgp_header",
    },
    EnvMapping {
        var_name: "SEALPOST_DEFAULT_KEY",
        field_path: "crypto.default_key",
    },
    EnvMapping {
        var_name: "SEALPOST_LOCKDOWN",
        field_path: "sys.lockdown",
    },
    EnvMapping {
        var_name: "SEALPOST_GPG_BINARY",
        field_path: "gnupg.binary",
    },
    EnvMapping {
        var_name: "SEALPOST_KEYSERVER",
        field_path: "gnupg.keyserver",
    },
    EnvMapping {
        var_name: "SEALPOST_LOG_LEVEL",
        field_path: "logging.level",
    },
    // Standard GnuPG home override.
    EnvMapping {
        var_name: "GNUPGHOME",
        field_path: "gnupg.homedir",
    },
];

/// Fields holding booleans; everything else mapped above is a string.
const BOOL_FIELDS: &[&str] = &["sys.lockdown"];

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply env var fallbacks to fields no config file set.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(ConfigLayer::is_file)
        {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        let value = if BOOL_FIELDS.contains(&mapping.field_path) {
            toml::Value::Boolean(matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ))
        } else {
            toml::Value::String(raw.clone())
        };
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    count
}

/// Set a dotted field path, creating intermediate tables as needed.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_env_fills_unset_and_default_fields() {
        let mut merged: toml::Value = toml::from_str("[sys]\nlockdown = false\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("sys.lockdown".to_owned(), ConfigLayer::Defaults);

        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &env(&[
                ("SEALPOST_LOCKDOWN", "yes"),
                ("SEALPOST_DEFAULT_KEY", "DEADBEEF"),
            ]),
        );

        assert_eq!(applied, 2);
        assert_eq!(merged["sys"]["lockdown"].as_bool(), Some(true));
        assert_eq!(merged["crypto"]["default_key"].as_str(), Some("DEADBEEF"));
        assert_eq!(
            sources.get("crypto.default_key"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_never_overrides_files() {
        let mut merged: toml::Value =
            toml::from_str("[gnupg]\nbinary = \"/opt/gpg\"\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("gnupg.binary".to_owned(), ConfigLayer::User);

        let applied = apply_env_fallbacks(
            &mut merged,
            &mut sources,
            &env(&[("SEALPOST_GPG_BINARY", "gpg2")]),
        );

        assert_eq!(applied, 0);
        assert_eq!(merged["gnupg"]["binary"].as_str(), Some("/opt/gpg"));
    }
}
