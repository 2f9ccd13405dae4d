//! End-to-end tests against a real conflicted Android `build.gradle.kts`.
//!
//! The fixture has three conflict regions: a Groovy-style `compileOptions`
//! block only on our side, diverging `compileOptions`/`kotlinOptions`
//! bodies, and a `dependencies` block only on their side.

use confmend_core::conflict::scanner::marker_lines;
use confmend_core::conflict::DEFAULT_MARKER_SIZE;
use confmend_core::errors::ValidationError;
use confmend_core::validation::FindingKind;
use confmend_core::{AppConfig, CoreError, Mender, Policy};

// ===========================================================================
// Helpers
// ===========================================================================

const FIXTURE: &str = include_str!("fixtures/journo.build.gradle.kts");

fn mender(policy: Policy) -> Mender {
    Mender::new(&AppConfig::default())
        .expect("default config is valid")
        .with_policy(Some(policy))
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn fixture_has_three_regions() {
    let doc = mender(Policy::Ours).scan(FIXTURE).unwrap();
    assert_eq!(doc.region_count(), 3);

    let starts: Vec<usize> = doc.regions().map(|r| r.start_line).collect();
    assert_eq!(starts, vec![9, 25, 63]);
    assert!(doc
        .regions()
        .all(|r| r.ours_label.as_deref() == Some("HEAD")));
}

#[test]
fn theirs_resolves_and_validates() {
    let resolved = mender(Policy::Theirs).run(FIXTURE).unwrap();
    let text = resolved.text();

    assert!(marker_lines(text, DEFAULT_MARKER_SIZE).is_empty());
    assert!(text.contains("coreLibraryDesugaringEnabled = true"));
    assert!(text.contains("coreLibraryDesugaring(\"com.android.tools:desugar_jdk_libs:2.0.4\")"));
    assert!(text.contains("jvmTarget = \"17\""));
    assert!(!text.contains("VERSION_11"));
    assert!(!text.contains("coreLibraryDesugaringEnabled true"));
    assert_eq!(resolved.outcomes().len(), 3);
}

#[test]
fn union_keeps_last_jvm_target_and_the_dependency() {
    let resolved = mender(Policy::Union).run(FIXTURE).unwrap();
    let text = resolved.text();

    assert!(marker_lines(text, DEFAULT_MARKER_SIZE).is_empty());
    // ours-only Groovy block survives the union
    assert!(text.contains("coreLibraryDesugaringEnabled true"));
    assert!(text.contains("coreLibraryDesugaringEnabled = true"));
    assert!(text.contains("jvmTarget = \"17\""));
    assert!(!text.contains("VERSION_11"));
    assert!(text.contains("dependencies {"));

    let outcomes = resolved.outcomes();
    assert!(outcomes.iter().all(|o| o.resolution == "merged"));
    assert_eq!(outcomes[1].shadowed.len(), 1);
    assert_eq!(outcomes[1].shadowed[0].key, "jvmTarget");
}

#[test]
fn ours_fails_the_desugaring_pairing() {
    let err = mender(Policy::Ours).run(FIXTURE).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    let CoreError::Validation(ValidationError::Invalid(findings)) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].line, 12);
    assert!(matches!(
        &findings[0].kind,
        FindingKind::MissingPairing { rule, .. } if rule == "core-library-desugaring"
    ));
}

#[test]
fn resolving_twice_is_idempotent() {
    let once = mender(Policy::Theirs).run(FIXTURE).unwrap().into_text();
    let no_policy = Mender::new(&AppConfig::default()).unwrap();
    let twice = no_policy.run(&once).unwrap();
    assert_eq!(twice.text(), once);
    assert!(twice.outcomes().is_empty());
}

#[test]
fn crlf_line_endings_survive() {
    let crlf = FIXTURE.replace('\n', "\r\n");
    let resolved = mender(Policy::Theirs).run(&crlf).unwrap();
    let expected = mender(Policy::Theirs)
        .run(FIXTURE)
        .unwrap()
        .into_text()
        .replace('\n', "\r\n");
    assert_eq!(resolved.text(), expected);
}

#[test]
fn truncated_fixture_is_malformed() {
    // Cut the file just before the last end marker.
    let cut = FIXTURE
        .rfind(">>>>>>>")
        .expect("fixture has end markers");
    let err = mender(Policy::Theirs).run(&FIXTURE[..cut]).unwrap_err();
    assert_eq!(err.exit_code(), 1);
    let CoreError::Conflict(conflict) = err else {
        panic!("expected a conflict error");
    };
    assert_eq!(conflict.line(), 63);
}

#[test]
fn check_lists_unresolved_markers() {
    let (doc, findings) = mender(Policy::Union).check(FIXTURE).unwrap();
    assert_eq!(doc.region_count(), 3);
    let markers = findings
        .iter()
        .filter(|f| f.kind == FindingKind::ResidualMarker)
        .count();
    assert_eq!(markers, 9);
}
