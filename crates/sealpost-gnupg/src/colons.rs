//! Parser for `gpg --with-colons` key listings.
//!
//! Only the records we need are interpreted: `sec`/`pub` start a key, the
//! first `fpr` after them is the primary fingerprint, `ssb`/`sub` mark the
//! start of subkeys (whose `fpr` records are ignored) and `uid` adds a user
//! id. Everything is validated into [`KeyInfo`] here; keys that do not
//! validate are skipped with a warning.

use chrono::{DateTime, NaiveDate};
use sealpost_core::{Capabilities, Fingerprint, KeyInfo, UserId};
use tracing::{trace, warn};

/// Field positions (0-based) in a colon record.
mod field {
    pub(super) const VALIDITY: usize = 1;
    pub(super) const LENGTH: usize = 2;
    pub(super) const KEY_ID: usize = 4;
    pub(super) const EXPIRES: usize = 6;
    pub(super) const USER_ID: usize = 9;
    pub(super) const CAPABILITIES: usize = 11;
}

/// Split a colon record into fields.
pub(crate) struct Record<'a>(Vec<&'a str>);

impl<'a> Record<'a> {
    pub(crate) fn new(line: &'a str) -> Self {
        Self(line.split(':').collect())
    }

    pub(crate) fn kind(&self) -> &'a str {
        self.get(0)
    }

    pub(crate) fn get(&self, idx: usize) -> &'a str {
        self.0.get(idx).copied().unwrap_or_default()
    }
}

/// A key being assembled from consecutive records.
struct Partial {
    key_id: String,
    length: String,
    validity: String,
    expires: Option<NaiveDate>,
    caps: String,
    fingerprint: Option<String>,
    in_primary: bool,
    uids: Vec<UserId>,
}

impl Partial {
    fn start(rec: &Record<'_>) -> Self {
        Self {
            key_id: rec.get(field::KEY_ID).to_owned(),
            length: rec.get(field::LENGTH).to_owned(),
            validity: rec.get(field::VALIDITY).to_owned(),
            expires: parse_date(rec.get(field::EXPIRES)),
            caps: rec.get(field::CAPABILITIES).to_owned(),
            fingerprint: None,
            in_primary: true,
            uids: Vec::new(),
        }
    }

    fn finish(self) -> Option<KeyInfo> {
        let Some(raw_fpr) = self.fingerprint else {
            warn!(key_id = %self.key_id, "key listing has no fingerprint, skipping");
            return None;
        };
        let fingerprint = match Fingerprint::parse(&raw_fpr) {
            Ok(f) => f,
            Err(e) => {
                warn!(key_id = %self.key_id, error = %e, "skipping key");
                return None;
            },
        };
        let Ok(key_size) = self.length.parse::<u32>() else {
            warn!(fingerprint = %fingerprint, length = %self.length, "bad key length, skipping");
            return None;
        };

        let key_id = if self.key_id.is_empty() {
            fingerprint.key_id().to_owned()
        } else {
            self.key_id.to_ascii_uppercase()
        };

        Some(KeyInfo {
            fingerprint,
            key_id,
            key_size,
            capabilities: Capabilities::from_letters(&self.caps),
            disabled: self.caps.contains('D'),
            revoked: self.validity == "r",
            expires: self.expires,
            uids: self.uids,
        })
    }
}

/// Parse a `--with-colons` listing into validated keys, in listing order.
pub(crate) fn parse_key_listing(output: &str) -> Vec<KeyInfo> {
    let mut keys = Vec::new();
    let mut current: Option<Partial> = None;

    for line in output.lines() {
        let rec = Record::new(line.trim_end());
        match rec.kind() {
            "sec" | "pub" => {
                if let Some(done) = current.take().and_then(Partial::finish) {
                    keys.push(done);
                }
                current = Some(Partial::start(&rec));
            },
            "fpr" => {
                if let Some(key) = current.as_mut()
                    && key.in_primary
                    && key.fingerprint.is_none()
                {
                    key.fingerprint = Some(rec.get(field::USER_ID).to_owned());
                }
            },
            "ssb" | "sub" => {
                if let Some(key) = current.as_mut() {
                    key.in_primary = false;
                }
            },
            "uid" => {
                if let Some(key) = current.as_mut() {
                    if rec.get(field::VALIDITY) == "r" {
                        trace!(key_id = %key.key_id, "skipping revoked uid");
                        continue;
                    }
                    key.uids
                        .push(UserId::parse(&unescape(rec.get(field::USER_ID))));
                }
            },
            _ => {},
        }
    }
    if let Some(done) = current.and_then(Partial::finish) {
        keys.push(done);
    }
    keys
}

/// Parse a colon-listing date: epoch seconds or `YYYYMMDDThhmmss`.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = raw.parse().ok()?;
        return DateTime::from_timestamp(secs, 0).map(|d| d.date_naive());
    }
    NaiveDate::parse_from_str(raw.get(..8)?, "%Y%m%d").ok()
}

/// Undo GnuPG's `\xHH` escaping in colon fields.
pub(crate) fn unescape(raw: &str) -> String {
    decode_escapes(raw, "\\x")
}

/// Undo keyserver `%HH` escaping.
pub(crate) fn percent_decode(raw: &str) -> String {
    decode_escapes(raw, "%")
}

fn decode_escapes(raw: &str, marker: &str) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find(marker) {
        bytes.extend_from_slice(&rest.as_bytes()[..pos]);
        let after = &rest[pos.saturating_add(marker.len())..];
        let hex = after
            .get(..2)
            .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()));
        match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
            Some(b) => {
                bytes.push(b);
                rest = &after[2..];
            },
            None => {
                bytes.extend_from_slice(marker.as_bytes());
                rest = after;
            },
        }
    }
    bytes.extend_from_slice(rest.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET_LISTING: &str = "\
sec:u:4096:1:AAAAAAAAAAAAAAAA:1400000000:::u:::scESC:::+:::23::0:
fpr:::::::::111111111111111111111111AAAAAAAAAAAAAAAA:
grp:::::::::0000000000000000000000000000000000000000:
uid:u::::1400000000::HASH::Alice Example (work) <alice@example.org>::::::::::0:
uid:r::::1400000000::HASH::Old Alice <alice@old.example.org>::::::::::0:
ssb:u:4096:1:BBBBBBBBBBBBBBBB:1400000000::::::e:::+:::23:
fpr:::::::::222222222222222222222222BBBBBBBBBBBBBBBB:
sec:r:1024:17:CCCCCCCCCCCCCCCC:1300000000:1350000000::u:::scD:::+:::23::0:
fpr:::::::::333333333333333333333333CCCCCCCCCCCCCCCC:
uid:r::::1300000000::HASH::Bob \\x3a the builder <bob@example.org>::::::::::0:
uid:u::::1300000000::HASH::Bob <bob@example.org>::::::::::0:
";

    #[test]
    fn test_parses_primary_fields() {
        let keys = parse_key_listing(SECRET_LISTING);
        assert_eq!(keys.len(), 2);

        let alice = &keys[0];
        assert_eq!(
            alice.fingerprint.as_str(),
            "111111111111111111111111AAAAAAAAAAAAAAAA"
        );
        assert_eq!(alice.key_id, "AAAAAAAAAAAAAAAA");
        assert_eq!(alice.key_size, 4096);
        assert!(alice.capabilities.is_usable());
        assert!(!alice.disabled);
        assert!(!alice.revoked);
        assert!(alice.expires.is_none());
        assert_eq!(alice.uids, vec![UserId::new("Alice Example", "alice@example.org")]);
    }

    #[test]
    fn test_parses_revoked_disabled_expiring_key() {
        let keys = parse_key_listing(SECRET_LISTING);
        let bob = &keys[1];
        assert_eq!(bob.key_size, 1024);
        assert!(bob.revoked);
        assert!(bob.disabled);
        assert!(!bob.capabilities.any());
        assert_eq!(bob.expires, NaiveDate::from_ymd_opt(2012, 10, 12));
        assert_eq!(bob.uids.len(), 1);
    }

    #[test]
    fn test_subkey_fingerprint_is_ignored() {
        let keys = parse_key_listing(SECRET_LISTING);
        assert!(keys.iter().all(|k| !k.fingerprint.as_str().starts_with('2')));
    }

    #[test]
    fn test_malformed_keys_are_skipped() {
        let listing = "\
sec:u:abc:1:AAAAAAAAAAAAAAAA:1400000000:::u:::scESC:
fpr:::::::::111111111111111111111111AAAAAAAAAAAAAAAA:
sec:u:2048:1:DDDDDDDDDDDDDDDD:1400000000:::u:::scESC:
fpr:::::::::not-hex:
sec:u:2048:1:EEEEEEEEEEEEEEEE:1400000000:::u:::scESC:
sec:u:3072:1:FFFFFFFFFFFFFFFF:1400000000:20300101T000000::u:::scESC:
fpr:::::::::444444444444444444444444FFFFFFFFFFFFFFFF:
";
        let keys = parse_key_listing(listing);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].key_size, 3072);
        assert_eq!(keys[0].expires, NaiveDate::from_ymd_opt(2030, 1, 1));
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("0"), NaiveDate::from_ymd_opt(1970, 1, 1));
        assert_eq!(parse_date("20261231T120000"), NaiveDate::from_ymd_opt(2026, 12, 31));
        assert_eq!(parse_date("garbage"), None);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a\\x3ab"), "a:b");
        assert_eq!(unescape("trailing\\x"), "trailing\\x");
        assert_eq!(percent_decode("Alice%20%3Calice%40example.org%3E"), "Alice <alice@example.org>");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%+4b"), "a%+4b");
        assert_eq!(unescape("a\\x+4b"), "a\\x+4b");
    }
}
