//! Parser for machine-readable keyserver search results.

use sealpost_core::{SearchHit, UserId};

use crate::colons::{Record, parse_date, percent_decode};

/// Parse `--with-colons --search-keys` output into hits, in result order.
///
/// `pub:<keyid>:<algo>:<bits>:<created>:<expires>:<flags>` starts a hit and
/// `uid:<escaped uid>:<created>:<expires>:<flags>` adds user ids to it.
pub(crate) fn parse_search_listing(output: &str) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = Vec::new();

    for line in output.lines() {
        let rec = Record::new(line.trim());
        match rec.kind() {
            "pub" => {
                let key_id = rec.get(1).trim();
                if key_id.is_empty() {
                    continue;
                }
                hits.push(SearchHit {
                    key_id: key_id.to_ascii_uppercase(),
                    key_size: rec.get(3).parse().ok(),
                    created: parse_date(rec.get(4)),
                    expires: parse_date(rec.get(5)),
                    revoked: rec.get(6).contains('r'),
                    uids: Vec::new(),
                });
            },
            "uid" => {
                if let Some(hit) = hits.last_mut() {
                    hit.uids.push(UserId::parse(&percent_decode(rec.get(1))));
                }
            },
            _ => {},
        }
    }
    hits
}
