//! Parameterised trigger matching tests for `glimpse-detector`.

use glimpse_core::Trigger;
use glimpse_detector::TriggerDetector;
use rstest::rstest;

fn detector(trigger: &str) -> TriggerDetector {
    TriggerDetector::new(Trigger::from(trigger)).expect("detector")
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

#[rstest]
#[case("pam_unix(login:auth): authentication failure; logname= uid=0")]
#[case("authentication failure")]
#[case("gdm-password]: pam_unix(gdm-password:auth): authentication failure; user=alice")]
#[case("prefix-authentication failure-suffix")]
fn lines_containing_trigger_match(#[case] line: &str) {
    assert!(detector("authentication failure").matches(line));
}

// ---------------------------------------------------------------------------
// Non-matches
// ---------------------------------------------------------------------------

#[rstest]
#[case("")]
#[case("session opened for user alice")]
#[case("Authentication Failure")]
#[case("AUTHENTICATION FAILURE")]
#[case("authentication  failure")]
#[case("authentication\tfailure")]
#[case("authentication fail")]
fn lines_without_exact_trigger_do_not_match(#[case] line: &str) {
    assert!(!detector("authentication failure").matches(line));
}

#[test]
fn regex_metacharacters_are_literal() {
    let d = detector("user=.*");
    assert!(d.matches("denied user=.* from host"));
    assert!(!d.matches("denied user=alice from host"));
}

#[test]
fn unicode_trigger_matches_verbatim() {
    let d = detector("échec d'authentification");
    assert!(d.matches("pam: échec d'authentification pour bob"));
    assert!(!d.matches("pam: echec d'authentification pour bob"));
}

#[test]
fn matching_is_stateless_across_calls() {
    let d = detector("Failed password");
    let lines = [
        "Failed password for root",
        "Accepted password for root",
        "Failed password for admin",
    ];
    let hits: Vec<bool> = lines.iter().map(|l| d.matches(l)).collect();
    assert_eq!(hits, vec![true, false, true]);
    assert_eq!(lines.iter().rev().filter(|l| d.matches(l)).count(), 2);
}
