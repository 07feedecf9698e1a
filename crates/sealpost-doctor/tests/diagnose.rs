//! Full diagnoses over mock keyrings and profile stores.

use std::sync::Arc;

use chrono::NaiveDate;
use sealpost_doctor::{DiagnoseOptions, Doctor, FindingKind, HealthPolicy, KeyHealth, remedy};
use sealpost_test::{KeyFixture, MockKeyRegistry, MockProfileStore, fingerprint, test_profile};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn doctor(registry: MockKeyRegistry, store: MockProfileStore) -> Doctor {
    Doctor::new(Arc::new(registry), Arc::new(store)).at(today())
}

fn keyring_a_good_b_small() -> MockKeyRegistry {
    MockKeyRegistry::new()
        .with_secret_key(KeyFixture::new('A').size(4096).uid("Alice", "alice@example.org").build())
        .with_secret_key(KeyFixture::new('B').size(1024).uid("Alice", "alice@example.org").build())
}

#[test]
fn test_small_key_fails_with_revoke_and_disable() {
    let verdict = doctor(keyring_a_good_b_small(), MockProfileStore::new())
        .diagnose(DiagnoseOptions::default())
        .unwrap();

    let (a, b) = (fingerprint('A'), fingerprint('B'));
    assert!(!verdict.passed);
    assert_eq!(verdict.serious, 1);
    assert_eq!(verdict.keys, 2);
    assert_eq!(verdict.profiles, 0);
    assert_eq!(verdict.message, "Sanity checked: 2 keys in GPG keyring, 0 profiles");

    assert_eq!(verdict.details.len(), 2);
    assert_eq!(verdict.details[0].description, format!("{a}: OK: 4096 bits, looks good!"));
    assert!(!verdict.details[0].serious);
    assert_eq!(verdict.details[1].description, format!("{b}: Bad: too small (1024 bits)"));
    assert_eq!(verdict.details[1].health, Some(KeyHealth::TooSmall(1024)));

    assert_eq!(
        verdict.fixes,
        vec![
            remedy::revoke_key(&b, Some("(optional)")),
            remedy::disable_key(&b, None),
        ]
    );
}

#[test]
fn test_default_key_on_bad_key_puts_config_fix_first() {
    let b = fingerprint('B');
    let verdict = doctor(keyring_a_good_b_small(), MockProfileStore::new())
        .with_default_key(Some(b.key_id().to_ascii_lowercase()))
        .diagnose(DiagnoseOptions::default())
        .unwrap();

    assert_eq!(verdict.serious, 2);
    let finding = verdict.details.last().unwrap();
    assert_eq!(finding.kind, FindingKind::DefaultKey);
    assert_eq!(finding.description, format!("{b}: configuration uses bad key"));

    assert_eq!(verdict.fixes.len(), 3);
    assert_eq!(verdict.fixes[0], remedy::config_fix(Some(&fingerprint('A'))));
    assert_eq!(verdict.fixes[1][0], "Revoke bad keys:  (optional)");
}

#[test]
fn test_default_key_on_good_key_is_fine() {
    let verdict = doctor(
        MockKeyRegistry::new().with_secret_key(KeyFixture::new('A').build()),
        MockProfileStore::new(),
    )
    .with_default_key(Some(fingerprint('A').to_string()))
    .diagnose(DiagnoseOptions::default())
    .unwrap();

    assert!(verdict.passed);
    assert!(verdict.fixes.is_empty());
    assert!(verdict.as_text().starts_with("Sanity checked: 1 keys in GPG keyring, 0 profiles.\n - "));
}

#[test]
fn test_no_healthy_key_prepends_generate_and_placeholder_fix() {
    let registry = MockKeyRegistry::new()
        .with_secret_key(KeyFixture::new('B').size(1024).build())
        .with_secret_key(KeyFixture::new('C').no_caps().revoked().build());
    let verdict = doctor(registry, MockProfileStore::new())
        .with_default_key(Some(fingerprint('B').to_string()))
        .diagnose(DiagnoseOptions::default())
        .unwrap();

    let b = fingerprint('B');
    assert_eq!(verdict.serious, 2);
    assert_eq!(
        verdict.fixes,
        vec![
            remedy::generate_key(2048),
            remedy::config_fix(None),
            remedy::revoke_key(&b, Some("(optional)")),
            remedy::disable_key(&b, None),
        ]
    );
    assert_eq!(
        verdict.details[1].description,
        format!("{}: --- Revoked.", fingerprint('C'))
    );
}

#[test]
fn test_empty_keyring_still_proposes_new_key() {
    let verdict = doctor(MockKeyRegistry::new(), MockProfileStore::new())
        .diagnose(DiagnoseOptions::default())
        .unwrap();

    assert!(verdict.passed);
    assert_eq!(verdict.fixes.len(), 2);
    assert_eq!(
        verdict.as_text().lines().next(),
        Some("Sanity checked: 0 keys in GPG keyring, 0 profiles. Looks good!")
    );
}

#[test]
fn test_profile_findings() {
    let b = fingerprint('B');
    let store = MockProfileStore::new()
        .with_profile(test_profile(
            "Alice",
            "alice@example.org",
            &[format!("data:key,{}", b.key_id().to_ascii_lowercase()).as_str()],
            "",
        ))
        .with_profile(test_profile("Bob", "bob@example.org", &[], ""));

    let verdict = doctor(keyring_a_good_b_small(), store)
        .diagnose(DiagnoseOptions::default())
        .unwrap();

    assert_eq!(verdict.serious, 3);
    assert_eq!(verdict.profiles, 2);
    let profile_findings: Vec<_> = verdict
        .details
        .iter()
        .filter(|f| f.profile.is_some())
        .map(|f| (f.kind, f.description.as_str()))
        .collect();
    assert_eq!(
        profile_findings,
        vec![
            (
                FindingKind::ProfileKey,
                format!("{b}: Bad key in profile Alice <alice@example.org> (alice@example.org)").as_str()
            ),
            (
                FindingKind::ProfileWithoutKey,
                "No key for Bob <bob@example.org> (bob@example.org)"
            ),
        ]
    );
}

#[test]
fn test_all_keys_checks_every_reference() {
    let a = fingerprint('A').to_string();
    let b = fingerprint('B').to_string();
    let store = MockProfileStore::new().with_profile(test_profile(
        "Alice",
        "alice@example.org",
        &[a.as_str(), "", b.as_str()],
        "",
    ));

    let first_only = doctor(keyring_a_good_b_small(), store.clone())
        .diagnose(DiagnoseOptions::default())
        .unwrap();
    assert_eq!(first_only.serious, 1);

    let all = doctor(keyring_a_good_b_small(), store)
        .diagnose(DiagnoseOptions {
            all_keys: true,
            quiet: false,
        })
        .unwrap();
    assert_eq!(all.serious, 2);
    assert_eq!(all.details.last().unwrap().kind, FindingKind::ProfileKey);
}

#[test]
fn test_quiet_pass_is_minimal() {
    let registry = MockKeyRegistry::new().with_secret_key(KeyFixture::new('A').build());
    let store = MockProfileStore::new().with_profile(test_profile(
        "Alice",
        "alice@example.org",
        &[fingerprint('A').as_str()],
        "",
    ));
    let verdict = doctor(registry, store)
        .diagnose(DiagnoseOptions {
            all_keys: false,
            quiet: true,
        })
        .unwrap();

    assert!(verdict.passed);
    assert_eq!(verdict.message, "OK");
    assert!(verdict.details.is_empty());
    assert!(verdict.fixes.is_empty());
}

#[test]
fn test_quiet_failure_keeps_details() {
    let verdict = doctor(keyring_a_good_b_small(), MockProfileStore::new())
        .diagnose(DiagnoseOptions {
            all_keys: false,
            quiet: true,
        })
        .unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.details.len(), 2);
}

#[test]
fn test_custom_thresholds() {
    let registry = MockKeyRegistry::new().with_secret_key(
        KeyFixture::new('A')
            .expires(NaiveDate::from_ymd_opt(2024, 6, 25).unwrap())
            .build(),
    );
    let lenient = doctor(registry.clone(), MockProfileStore::new())
        .diagnose(DiagnoseOptions::default())
        .unwrap();
    assert!(lenient.passed);

    let strict = doctor(registry, MockProfileStore::new())
        .with_policy(HealthPolicy {
            min_key_bits: 2048,
            expiry_warning_days: 30,
        })
        .diagnose(DiagnoseOptions::default())
        .unwrap();
    assert!(!strict.passed);
    assert_eq!(
        strict.details[0].health,
        Some(KeyHealth::ExpiresSoon(NaiveDate::from_ymd_opt(2024, 6, 25).unwrap()))
    );
}

#[test]
fn test_verdict_serializes() {
    let verdict = doctor(keyring_a_good_b_small(), MockProfileStore::new())
        .diagnose(DiagnoseOptions::default())
        .unwrap();
    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(json["passed"], false);
    assert_eq!(json["details"][1]["kind"], "key");
    assert_eq!(json["details"][1]["health"]["status"], "too_small");
    assert_eq!(json["details"][1]["health"]["value"], 1024);
    assert!(json["details"][1].get("profile").is_none());
}
