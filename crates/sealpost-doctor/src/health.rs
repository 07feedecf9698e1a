//! Per-key health classification.
//!
//! # Check Order
//!
//! First match wins:
//!
//! 1. Disabled -> [`KeyHealth::Disabled`]
//! 2. Missing sign or encrypt:
//!    revoked -> [`KeyHealth::Revoked`],
//!    expired -> [`KeyHealth::Expired`],
//!    otherwise [`KeyHealth::Useless`]
//! 3. Expires within the warning window -> [`KeyHealth::ExpiresSoon`]
//! 4. Smaller than the minimum size -> [`KeyHealth::TooSmall`]
//! 5. Otherwise -> [`KeyHealth::Healthy`]

use chrono::{Days, NaiveDate};
use sealpost_core::{Fingerprint, KeyInfo};
use serde::{Deserialize, Serialize};

/// Default smallest acceptable key, in bits.
pub const DEFAULT_MIN_KEY_BITS: u32 = 2048;

/// Default number of days before expiry at which a key is flagged.
pub const DEFAULT_EXPIRY_WARNING_DAYS: u32 = 14;

/// Thresholds used when classifying keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPolicy {
    /// Smallest acceptable key size in bits.
    pub min_key_bits: u32,
    /// Keys expiring within this many days are flagged.
    pub expiry_warning_days: u32,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            min_key_bits: DEFAULT_MIN_KEY_BITS,
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
        }
    }
}

impl HealthPolicy {
    /// Classify `key` as of `today`.
    #[must_use]
    pub fn classify(&self, key: &KeyInfo, today: NaiveDate) -> KeyHealth {
        if key.disabled {
            return KeyHealth::Disabled;
        }

        if !key.capabilities.is_usable() {
            return match key.expires {
                _ if key.revoked => KeyHealth::Revoked,
                Some(date) if date <= today => KeyHealth::Expired(date),
                _ => KeyHealth::Useless,
            };
        }

        let horizon = today
            .checked_add_days(Days::new(u64::from(self.expiry_warning_days)))
            .unwrap_or(NaiveDate::MAX);
        if let Some(date) = key.expires.filter(|d| *d <= horizon) {
            return KeyHealth::ExpiresSoon(date);
        }

        if key.key_size < self.min_key_bits {
            return KeyHealth::TooSmall(key.key_size);
        }

        KeyHealth::Healthy(key.key_size)
    }
}

/// Outcome of classifying one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum KeyHealth {
    /// Disabled in the keyring; ignored.
    Disabled,
    /// Revoked and unusable; ignored.
    Revoked,
    /// Unusable and already expired.
    Expired(NaiveDate),
    /// Unusable for another reason.
    Useless,
    /// Usable but expiring (or expired) within the warning window.
    ExpiresSoon(NaiveDate),
    /// Usable but below the minimum size.
    TooSmall(u32),
    /// Fit for use; carries the key size.
    Healthy(u32),
}

impl KeyHealth {
    /// Whether the key is fit for use.
    #[must_use]
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy(_))
    }

    /// Whether the key needs the user's attention.
    #[must_use]
    pub fn is_serious(self) -> bool {
        !matches!(self, Self::Disabled | Self::Revoked | Self::Healthy(_))
    }

    /// Human-readable finding for the key.
    #[must_use]
    pub fn describe(self, fingerprint: &Fingerprint) -> String {
        match self {
            Self::Disabled => format!("{fingerprint}: --- Disabled."),
            Self::Revoked => format!("{fingerprint}: --- Revoked."),
            Self::Expired(date) => format!("{fingerprint}: Bad: expired on {date}"),
            Self::Useless => format!("{fingerprint}: Bad: key is useless"),
            Self::ExpiresSoon(date) => format!("{fingerprint}: Bad: expires on {date}"),
            Self::TooSmall(bits) => format!("{fingerprint}: Bad: too small ({bits} bits)"),
            Self::Healthy(bits) => format!("{fingerprint}: OK: {bits} bits, looks good!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use sealpost_core::Capabilities;
    use sealpost_test::KeyFixture;

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TODAY: (i32, u32, u32) = (2024, 3, 1);

    fn classify(key: &KeyInfo) -> KeyHealth {
        HealthPolicy::default().classify(key, day(TODAY.0, TODAY.1, TODAY.2))
    }

    #[test]
    fn test_disabled_wins_over_everything() {
        let key = KeyFixture::new('A').size(512).no_caps().revoked().disabled().build();
        assert_eq!(classify(&key), KeyHealth::Disabled);
    }

    #[test]
    fn test_unusable_keys() {
        let sign_only = Capabilities {
            sign: true,
            ..Capabilities::default()
        };
        let revoked = KeyFixture::new('A').caps(sign_only).revoked().build();
        assert_eq!(classify(&revoked), KeyHealth::Revoked);

        let expired = KeyFixture::new('A').no_caps().expires(day(2024, 3, 1)).build();
        assert_eq!(classify(&expired), KeyHealth::Expired(day(2024, 3, 1)));

        let future = KeyFixture::new('A').no_caps().expires(day(2024, 3, 2)).build();
        assert_eq!(classify(&future), KeyHealth::Useless);

        assert_eq!(classify(&KeyFixture::new('A').no_caps().build()), KeyHealth::Useless);
    }

    #[test]
    fn test_expiry_window_is_inclusive() {
        let edge = KeyFixture::new('A').expires(day(2024, 3, 15)).build();
        assert_eq!(classify(&edge), KeyHealth::ExpiresSoon(day(2024, 3, 15)));

        let past = KeyFixture::new('A').expires(day(2023, 1, 1)).build();
        assert_eq!(classify(&past), KeyHealth::ExpiresSoon(day(2023, 1, 1)));

        let later = KeyFixture::new('A').expires(day(2024, 3, 16)).build();
        assert_eq!(classify(&later), KeyHealth::Healthy(4096));
    }

    #[test]
    fn test_expiry_checked_before_size() {
        let key = KeyFixture::new('A').size(1024).expires(day(2024, 3, 5)).build();
        assert_eq!(classify(&key), KeyHealth::ExpiresSoon(day(2024, 3, 5)));
    }

    #[test]
    fn test_size_threshold() {
        assert_eq!(classify(&KeyFixture::new('A').size(2047).build()), KeyHealth::TooSmall(2047));
        assert_eq!(classify(&KeyFixture::new('A').size(2048).build()), KeyHealth::Healthy(2048));

        let strict = HealthPolicy {
            min_key_bits: 3072,
            ..HealthPolicy::default()
        };
        let key = KeyFixture::new('A').size(2048).build();
        assert_eq!(strict.classify(&key, day(2024, 3, 1)), KeyHealth::TooSmall(2048));
    }

    #[test]
    fn test_seriousness() {
        assert!(!KeyHealth::Disabled.is_serious());
        assert!(!KeyHealth::Revoked.is_serious());
        assert!(!KeyHealth::Healthy(4096).is_serious());
        assert!(KeyHealth::Useless.is_serious());
        assert!(KeyHealth::TooSmall(1024).is_serious());
        assert!(!KeyHealth::Disabled.is_healthy());
    }

    #[test]
    fn test_descriptions() {
        let fpr = sealpost_test::fingerprint('B');
        assert_eq!(
            KeyHealth::TooSmall(1024).describe(&fpr),
            format!("{fpr}: Bad: too small (1024 bits)")
        );
        assert_eq!(
            KeyHealth::Expired(day(2020, 1, 2)).describe(&fpr),
            format!("{fpr}: Bad: expired on 2020-01-02")
        );
        assert_eq!(
            KeyHealth::Healthy(4096).describe(&fpr),
            format!("{fpr}: OK: 4096 bits, looks good!")
        );
    }
}
