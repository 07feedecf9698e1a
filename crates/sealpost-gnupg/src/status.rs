//! Parser for `--status-fd` import output.

use sealpost_core::{Fingerprint, ImportSummary, ImportedKey};
use tracing::{debug, warn};

const STATUS_PREFIX: &str = "[GNUPG:] ";

/// `IMPORT_OK` reason bit for a key new to the keyring.
const REASON_NEW_KEY: u32 = 0x01;

/// Summarize the `IMPORT_OK` / `IMPORT_RES` lines of an import.
///
/// A reason of 0 means unchanged, the "new key" bit means imported, and any
/// other bit (new uids, signatures, subkeys, secret material) means updated.
/// When present, the `IMPORT_RES` unchanged count wins over our own tally.
pub(crate) fn parse_import_status(output: &str) -> ImportSummary {
    let mut summary = ImportSummary::default();
    let mut reported_unchanged = None;

    for line in output.lines() {
        let Some(status) = line.trim().strip_prefix(STATUS_PREFIX) else {
            continue;
        };
        let mut parts = status.split_whitespace();
        match parts.next() {
            Some("IMPORT_OK") => {
                let reason = parts.next().and_then(|r| r.parse::<u32>().ok());
                let fpr = parts.next().map(Fingerprint::parse);
                match (reason, fpr) {
                    (Some(0), _) => {
                        summary.unchanged = summary.unchanged.saturating_add(1);
                    },
                    (Some(reason), Some(Ok(fingerprint))) => {
                        debug!(%fingerprint, reason, "key imported");
                        let key = ImportedKey { fingerprint };
                        if reason & REASON_NEW_KEY == 0 {
                            summary.updated.push(key);
                        } else {
                            summary.imported.push(key);
                        }
                    },
                    _ => warn!(line = status, "unparseable IMPORT_OK status"),
                }
            },
            Some("IMPORT_RES") => {
                // count no_user_id imported imported_rsa unchanged ...
                reported_unchanged = parts.nth(4).and_then(|n| n.parse::<usize>().ok());
            },
            _ => {},
        }
    }

    if let Some(unchanged) = reported_unchanged {
        summary.unchanged = unchanged;
    }
    summary
}
