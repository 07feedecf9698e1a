//! Command layer behaviour against mock collaborators.

use std::sync::{Arc, Mutex};

use sealpost_cli::{
    CommandError, CommandResult, CommandStatus, KeyCommands, KeyFetcher, LOCKDOWN_MESSAGE,
    PreviewRequest, check_keys, preview,
};
use sealpost_core::{CacheScope, Fingerprint, ImportSummary, ImportedKey, SearchHit, UserId};
use sealpost_doctor::{DiagnoseOptions, Doctor};
use sealpost_test::{
    KeyFixture, MockKeyRegistry, MockProfileStore, RecordingParseCache, fingerprint, test_profile,
};

/// Serves canned bodies and records requested URLs.
#[derive(Default)]
struct StubFetcher {
    urls: Mutex<Vec<String>>,
}

impl KeyFetcher for StubFetcher {
    fn fetch(&self, url: &str) -> CommandResult<Vec<u8>> {
        self.urls.lock().unwrap().push(url.to_owned());
        Ok(format!("armored key from {url}").into_bytes())
    }
}

struct Harness {
    registry: MockKeyRegistry,
    cache: RecordingParseCache,
    fetcher: Arc<StubFetcher>,
}

impl Harness {
    fn new(registry: MockKeyRegistry) -> Self {
        Self {
            registry,
            cache: RecordingParseCache::new(),
            fetcher: Arc::new(StubFetcher::default()),
        }
    }

    fn commands(&self) -> KeyCommands {
        KeyCommands::new(
            Arc::new(self.registry.clone()),
            Arc::new(self.cache.clone()),
            self.fetcher.clone(),
        )
    }
}

fn summary(new: &[char], updated: &[char], unchanged: usize) -> ImportSummary {
    let keys = |digits: &[char]| -> Vec<ImportedKey> {
        digits
            .iter()
            .map(|d| ImportedKey {
                fingerprint: fingerprint(*d),
            })
            .collect()
    };
    ImportSummary {
        imported: keys(new),
        updated: keys(updated),
        unchanged,
    }
}

#[test]
fn test_lockdown_refuses_mutations() {
    let h = Harness::new(MockKeyRegistry::new());
    let commands = h.commands().with_lockdown(true);

    let outcomes = [
        commands.receive_key(&["ABCD1234".to_owned()]).unwrap(),
        commands.import_key(&[], &["key".to_owned()]).unwrap(),
        commands.sign_key(Some("ABCD1234"), None).unwrap(),
    ];
    for outcome in outcomes {
        assert_eq!(outcome.status, CommandStatus::Error);
        assert_eq!(outcome.message, LOCKDOWN_MESSAGE);
        assert_eq!(outcome.exit_code(), 1);
    }
    assert!(h.registry.calls().is_empty());
    assert!(h.cache.invalidations().is_empty());
}

#[test]
fn test_lockdown_still_allows_reads() {
    let h = Harness::new(MockKeyRegistry::new());
    let outcome = h.commands().with_lockdown(true).list_secret_keys().unwrap();
    assert!(outcome.is_success());
    assert_eq!(h.registry.calls(), ["list_secret_keys"]);
}

#[test]
fn test_import_reads_files_and_fetches_urls() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("alice.asc");
    std::fs::write(&file, "alice key").unwrap();

    let h = Harness::new(MockKeyRegistry::new().with_import_result(summary(&['1'], &['2'], 1)));
    let args = [
        file.display().to_string(),
        "https://keys.example.org/bob.asc".to_owned(),
    ];
    let outcome = h.commands().import_key(&args, &["inline key".to_owned()]).unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        outcome.message,
        "Imported 3 key sources: 1 new, 1 updated, 1 unchanged"
    );
    assert_eq!(
        *h.fetcher.urls.lock().unwrap(),
        ["https://keys.example.org/bob.asc"]
    );

    let joined = "inline key\nalice key\narmored key from https://keys.example.org/bob.asc";
    assert_eq!(h.registry.calls(), [format!("import_keys:{}", joined.len())]);
    assert_eq!(h.cache.invalidations(), [CacheScope::PgpMime]);
    assert_eq!(outcome.result["imported"][0]["fingerprint"], "1".repeat(40));
}

#[test]
fn test_import_without_sources() {
    let h = Harness::new(MockKeyRegistry::new());
    let err = h.commands().import_key(&[], &[]).unwrap_err();
    assert!(matches!(err, CommandError::MissingArgument(_)));
    assert!(h.cache.invalidations().is_empty());
}

#[test]
fn test_unreadable_key_file() {
    let h = Harness::new(MockKeyRegistry::new());
    let err = h
        .commands()
        .import_key(&["/nonexistent/sealpost/key.asc".to_owned()], &[])
        .unwrap_err();
    assert!(matches!(err, CommandError::ReadKeyFile { .. }));
    assert!(h.registry.calls().is_empty());
}

#[test]
fn test_failed_mutation_still_invalidates_cache() {
    let h = Harness::new(MockKeyRegistry::new().failing("gpg: no valid OpenPGP data found"));
    let err = h.commands().import_key(&[], &["garbage".to_owned()]).unwrap_err();
    assert!(matches!(err, CommandError::Registry(_)));
    assert_eq!(h.cache.invalidations(), [CacheScope::PgpMime]);
}

#[test]
fn test_receive_merges_results() {
    let h = Harness::new(
        MockKeyRegistry::new()
            .with_import_result(summary(&['1'], &[], 0))
            .with_import_result(summary(&[], &[], 1)),
    );
    let outcome = h
        .commands()
        .receive_key(&["AAAA1111".to_owned(), "BBBB2222".to_owned()])
        .unwrap();

    assert_eq!(
        outcome.message,
        "Received 2 key sources: 1 new, 0 updated, 1 unchanged"
    );
    assert_eq!(
        h.registry.calls(),
        ["receive_key:AAAA1111", "receive_key:BBBB2222"]
    );
    assert_eq!(h.cache.invalidations(), [CacheScope::PgpMime]);
}

#[test]
fn test_receive_requires_key_id() {
    let h = Harness::new(MockKeyRegistry::new());
    assert!(matches!(
        h.commands().receive_key(&[]),
        Err(CommandError::MissingArgument(_))
    ));
}

#[test]
fn test_sign_key() {
    let h = Harness::new(MockKeyRegistry::new());
    let commands = h.commands();

    let err = commands.sign_key(None, None).unwrap_err();
    assert_eq!(err.to_string(), "You must supply a keyid");

    let outcome = commands.sign_key(Some("ABCD1234"), None).unwrap();
    assert_eq!(outcome.message, "Signed ABCD1234 with the default key");
    let outcome = commands.sign_key(Some("ABCD1234"), Some("FFFF0000")).unwrap();
    assert_eq!(outcome.message, "Signed ABCD1234 with FFFF0000");

    assert_eq!(
        h.registry.calls(),
        ["sign_key:ABCD1234:-", "sign_key:ABCD1234:FFFF0000"]
    );
    assert_eq!(h.cache.invalidations().len(), 2);
}

#[test]
fn test_search_joins_terms_and_renders() {
    let hits = vec![SearchHit {
        key_id: "ABCD1234".to_owned(),
        uids: vec![UserId::new("Alice", "alice@example.org")],
        ..SearchHit::default()
    }];
    let h = Harness::new(MockKeyRegistry::new().with_search_hits(hits));
    let outcome = h
        .commands()
        .search_key(&["alice  example".to_owned(), "org".to_owned()])
        .unwrap();

    assert_eq!(h.registry.calls(), ["search_key:alice example org"]);
    assert_eq!(outcome.text, "ABCD1234: Alice <alice@example.org>");

    let empty = Harness::new(MockKeyRegistry::new());
    assert_eq!(
        empty.commands().search_key(&["nobody".to_owned()]).unwrap().text,
        "No results"
    );
    assert!(matches!(
        empty.commands().search_key(&[" ".to_owned()]),
        Err(CommandError::MissingArgument(_))
    ));
}

#[test]
fn test_list_keys_requires_address() {
    let h = Harness::new(MockKeyRegistry::new());
    let err = h.commands().list_keys(Some("  ")).unwrap_err();
    assert_eq!(err.to_string(), "Must supply e-mail address");

    let alice = KeyFixture::new('A').uid("Alice", "alice@example.org").build();
    let h = Harness::new(MockKeyRegistry::new().with_public_key(alice));
    let outcome = h.commands().list_keys(Some("alice@example.org")).unwrap();
    assert_eq!(outcome.result.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_check_keys_failure_is_error_shaped() {
    let registry = MockKeyRegistry::new()
        .with_secret_key(KeyFixture::new('A').build())
        .with_secret_key(KeyFixture::new('B').size(1024).build());
    let doctor = Doctor::new(Arc::new(registry), Arc::new(MockProfileStore::new()));

    let outcome = check_keys(&doctor, DiagnoseOptions::default()).unwrap();
    assert_eq!(outcome.status, CommandStatus::Error);
    assert_eq!(outcome.result["passed"], false);
    assert_eq!(outcome.result["keys"], 2);
    assert_eq!(outcome.result["profiles"], 0);
    assert!(outcome.text.contains("Bad: too small (1024 bits)"));
    assert!(outcome.text.contains("\n\nProposed fixes:\n - "));
    assert!(outcome.text.contains("Revoke bad keys:  (optional)"));
}

#[test]
fn test_check_keys_quiet_pass() {
    let registry = MockKeyRegistry::new().with_secret_key(KeyFixture::new('A').build());
    let doctor = Doctor::new(Arc::new(registry), Arc::new(MockProfileStore::new()));
    let outcome = check_keys(
        &doctor,
        DiagnoseOptions {
            all_keys: false,
            quiet: true,
        },
    )
    .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.text, "OK. Looks good!");
    assert_eq!(outcome.result["keys"], 1);
    assert_eq!(outcome.result["message"], "OK");
}

#[test]
fn test_preview_reports_header_and_wrapper() {
    let registry = MockKeyRegistry::new()
        .with_public_key(
            KeyFixture::new('A')
                .uid("Alice", "alice@example.org")
                .build(),
        )
        .with_export(&"A".repeat(16), b"alice public key");
    let store = MockProfileStore::new().with_profile(test_profile(
        "Alice",
        "alice@example.org",
        &["x,ABCD1234"],
        "openpgp_header:SE",
    ));

    let outcome = preview(
        Arc::new(registry),
        Arc::new(store),
        None,
        &PreviewRequest {
            from: "Alice <alice@example.org>".to_owned(),
            to: vec!["bob@example.org".to_owned()],
            policy: "openpgp-sign-encrypt".to_owned(),
            attach_key: true,
            prefer_inline: false,
        },
    )
    .unwrap();

    let headers = outcome.result["headers"].as_array().unwrap();
    let header = |name: &str| {
        headers
            .iter()
            .find(|h| h[0] == name)
            .and_then(|h| h[1].as_str())
            .map(str::to_owned)
    };
    assert_eq!(
        header("OpenPGP").as_deref(),
        Some("id=ABCD1234; preference=signencrypt")
    );
    assert_eq!(header("X-Sealpost-Pubkeys-Attached").as_deref(), Some("1"));
    assert_eq!(
        outcome.result["attachments"][0]["filename"],
        "Encryption key for Alice.asc"
    );
    assert_eq!(outcome.result["attachments"][0]["bytes"], 16);
    assert_eq!(outcome.result["wrapper"], "sign-encrypt");
    assert_eq!(outcome.result["matched"], true);
    assert_eq!(outcome.result["proceed"], false);
}

#[test]
fn test_fingerprint_fixture_is_valid() {
    assert!(Fingerprint::parse(fingerprint('9').as_str()).is_ok());
}
