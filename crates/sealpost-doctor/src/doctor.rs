//! The diagnostic engine.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use sealpost_core::{Fingerprint, KeyInfo, KeyRegistry, ProfileRecord, ProfileStore};
use tracing::{debug, info};

use crate::error::DoctorResult;
use crate::health::HealthPolicy;
use crate::remedy;
use crate::verdict::{Finding, FindingKind, Verdict};

/// Switches for a single diagnosis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnoseOptions {
    /// Check every key a profile lists, not only the first.
    pub all_keys: bool,
    /// Collapse a passing verdict to a bare `OK`.
    pub quiet: bool,
}

/// Audits the secret keyring, the default key and every profile.
pub struct Doctor {
    registry: Arc<dyn KeyRegistry>,
    profiles: Arc<dyn ProfileStore>,
    default_key: Option<String>,
    policy: HealthPolicy,
    today: Option<NaiveDate>,
}

/// Per-key results gathered in keyring order.
#[derive(Default)]
struct KeyringScan<'a> {
    serious: usize,
    details: Vec<Finding>,
    fixes: Vec<Vec<String>>,
    bad: Vec<&'a Fingerprint>,
    best: Option<&'a KeyInfo>,
}

impl Doctor {
    /// Create an engine with default thresholds and no default key.
    #[must_use]
    pub fn new(registry: Arc<dyn KeyRegistry>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            registry,
            profiles,
            default_key: None,
            policy: HealthPolicy::default(),
            today: None,
        }
    }

    /// Cross-check this configured default key (fingerprint or suffix).
    #[must_use]
    pub fn with_default_key(mut self, default_key: Option<String>) -> Self {
        self.default_key = default_key
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty());
        self
    }

    /// Override the classification thresholds.
    #[must_use]
    pub fn with_policy(mut self, policy: HealthPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Evaluate expiry against a fixed date instead of the local date.
    #[must_use]
    pub fn at(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Run the full diagnosis.
    ///
    /// # Errors
    ///
    /// Returns [`DoctorError::Registry`](crate::DoctorError::Registry) if the
    /// secret keyring cannot be listed.
    pub fn diagnose(&self, options: DiagnoseOptions) -> DoctorResult<Verdict> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let keys = self.registry.list_secret_keys()?;
        let profiles = self.profiles.profiles();

        let mut scan = self.scan_keys(&keys, today);
        self.check_default_key(&mut scan);
        for profile in &profiles {
            check_profile(profile, options.all_keys, &mut scan);
        }

        if scan.best.is_none() {
            scan.fixes.splice(
                0..0,
                [remedy::generate_key(self.policy.min_key_bits), remedy::config_fix(None)],
            );
        }

        info!(
            keys = keys.len(),
            profiles = profiles.len(),
            serious = scan.serious,
            "key health check finished"
        );

        if options.quiet && scan.serious == 0 {
            return Ok(Verdict::quiet_ok(keys.len(), profiles.len()));
        }

        Ok(Verdict {
            passed: scan.serious == 0,
            serious: scan.serious,
            details: scan.details,
            fixes: scan.fixes,
            keys: keys.len(),
            profiles: profiles.len(),
            message: format!(
                "Sanity checked: {} keys in GPG keyring, {} profiles",
                keys.len(),
                profiles.len()
            ),
        })
    }

    fn scan_keys<'a>(&self, keys: &'a [KeyInfo], today: NaiveDate) -> KeyringScan<'a> {
        let mut scan = KeyringScan::default();
        for key in keys {
            let health = self.policy.classify(key, today);
            debug!(fingerprint = %key.fingerprint, ?health, "classified key");

            scan.details.push(Finding {
                kind: FindingKind::Key,
                serious: health.is_serious(),
                description: health.describe(&key.fingerprint),
                key: Some(key.fingerprint.to_string()),
                health: Some(health),
                profile: None,
            });

            if health.is_serious() {
                scan.fixes.push(remedy::revoke_key(&key.fingerprint, Some("(optional)")));
                scan.fixes.push(remedy::disable_key(&key.fingerprint, None));
                scan.serious = scan.serious.saturating_add(1);
            }

            if health.is_healthy() {
                if scan.best.is_none_or(|best| best.key_size < key.key_size) {
                    scan.best = Some(key);
                }
            } else {
                scan.bad.push(&key.fingerprint);
            }
        }
        scan
    }

    fn check_default_key(&self, scan: &mut KeyringScan<'_>) {
        let Some(default_key) = self.default_key.as_deref() else {
            return;
        };

        let mut uses_bad_key = false;
        for fpr in scan.bad.iter().filter(|f| f.matches_suffix(default_key)) {
            scan.details.push(Finding {
                kind: FindingKind::DefaultKey,
                serious: true,
                description: format!("{fpr}: configuration uses bad key"),
                key: Some(fpr.to_string()),
                health: None,
                profile: None,
            });
            scan.serious = scan.serious.saturating_add(1);
            uses_bad_key = true;
        }

        if let Some(best) = scan.best.filter(|_| uses_bad_key) {
            scan.fixes.insert(0, remedy::config_fix(Some(&best.fingerprint)));
        }
    }
}

fn check_profile(profile: &ProfileRecord, all_keys: bool, scan: &mut KeyringScan<'_>) {
    let refs = profile.key_refs(all_keys);

    for key_ref in &refs {
        let wanted = key_ref.fingerprint_part();
        if wanted.is_empty() {
            continue;
        }
        let Some(fpr) = scan.bad.iter().find(|f| f.matches_suffix(wanted)) else {
            continue;
        };
        debug!(fingerprint = %fpr, profile = %profile.id, "profile references bad key");
        let finding = Finding {
            kind: FindingKind::ProfileKey,
            serious: true,
            description: format!(
                "{fpr}: Bad key in profile {} <{}> ({})",
                profile.name, profile.email, profile.id
            ),
            key: Some(fpr.to_string()),
            health: None,
            profile: Some(profile.id.clone()),
        };
        scan.details.push(finding);
        scan.serious = scan.serious.saturating_add(1);
    }

    if refs.is_empty() {
        scan.details.push(Finding {
            kind: FindingKind::ProfileWithoutKey,
            serious: true,
            description: format!(
                "No key for {} <{}> ({})",
                profile.name, profile.email, profile.id
            ),
            key: None,
            health: None,
            profile: Some(profile.id.clone()),
        });
        scan.serious = scan.serious.saturating_add(1);
    }
}
