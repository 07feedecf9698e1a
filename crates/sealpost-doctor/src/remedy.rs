//! Remediation step-groups.
//!
//! Each function returns one group: a heading followed by the steps.

use sealpost_core::Fingerprint;

/// Placeholder used when no healthy key exists yet.
pub const FINGERPRINT_PLACEHOLDER: &str = "<FINGERPRINT>";

/// Generate a replacement key.
#[must_use]
pub fn generate_key(min_bits: u32) -> Vec<String> {
    vec![
        "You need a new key!".to_owned(),
        "Run: `gpg --gen-key`".to_owned(),
        format!("Answer the tool's questions: use RSA and RSA, {min_bits} bits or more"),
    ]
}

/// Point the configuration at a good key.
#[must_use]
pub fn config_fix(good_key: Option<&Fingerprint>) -> Vec<String> {
    let fpr = good_key.map_or(FINGERPRINT_PLACEHOLDER, Fingerprint::as_str);
    vec![
        "Update the Sealpost config to use a good key:".to_owned(),
        "IMPORTANT: This MUST be done before disabling the key!".to_owned(),
        format!("Set: `[crypto] default_key = \"{fpr}\"` in ~/.sealpost/config.toml"),
        "Profiles that list the old key need the new fingerprint as well".to_owned(),
    ]
}

/// Revoke a bad key.
#[must_use]
pub fn revoke_key(fingerprint: &Fingerprint, comment: Option<&str>) -> Vec<String> {
    vec![
        heading("Revoke bad keys:", comment),
        format!("Run: `gpg --gen-revoke {fingerprint}`"),
        "Say yes to the first question, follow the instructions".to_owned(),
        "A revocation certificate will be shown on screen".to_owned(),
        "Copy & paste that, save, and send to people who have the old key".to_owned(),
        "You can search for `is:encrypted to:me` to find such people".to_owned(),
    ]
}

/// Disable a bad key.
#[must_use]
pub fn disable_key(fingerprint: &Fingerprint, comment: Option<&str>) -> Vec<String> {
    vec![
        heading("Disable bad keys:", comment),
        format!("Run: `gpg --edit-key {fingerprint}`"),
        "Type `disable`".to_owned(),
        "Type `save`".to_owned(),
    ]
}

fn heading(title: &str, comment: Option<&str>) -> String {
    match comment {
        Some(comment) if !comment.is_empty() => format!("{title}  {comment}"),
        _ => title.to_owned(),
    }
}
