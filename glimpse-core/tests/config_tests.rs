//! Config loading, defaulting, and validation tests.

use std::path::PathBuf;
use std::time::Duration;

use assert_fs::prelude::*;
use glimpse_core::{
    config::{self, DEFAULT_CONFIG_PATH},
    ConfigError, Trigger,
};
use predicates::prelude::predicate;
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Missing / explicit files
// ---------------------------------------------------------------------------

#[test]
fn explicit_missing_config_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.child("config.yaml");
    path.assert(predicate::path::missing());

    let err = config::load_at(path.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn missing_default_config_falls_back_to_builtin_defaults() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let config = config::load_or_default_at(&dir.path().join("absent.yaml")).expect("load");
    assert_eq!(config.trigger.as_str(), "authentication failure");
    assert_eq!(config.debounce_window(), Duration::from_secs(4));
    assert!(DEFAULT_CONFIG_PATH.ends_with("config.yaml"));
}

// ---------------------------------------------------------------------------
// 2. Partial overrides
// ---------------------------------------------------------------------------

#[test]
fn partial_yaml_overrides_only_named_fields() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(
        "trigger: \"Failed password\"\n\
         debounce_secs: 10\n\
         artifacts:\n  dir: /srv/captures\n\
         owner:\n  user: camera\n",
    )
    .expect("write");

    let config = config::load_at(file.path()).expect("load");
    assert_eq!(config.trigger, Trigger::from("Failed password"));
    assert_eq!(config.debounce_secs, 10);
    assert_eq!(config.artifacts.dir, PathBuf::from("/srv/captures"));
    assert_eq!(config.artifacts.prefix, "failed-login", "untouched default");
    assert_eq!(config.owner.user.as_deref(), Some("camera"));
    assert!(config.owner.group.is_none());
    assert_eq!(config.capture.timeout(), Duration::from_secs(5));
}

#[test]
fn rendered_yaml_loads_back_identically() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let original = config::load_or_default_at(&dir.path().join("none.yaml")).expect("defaults");
    let file = dir.child("config.yaml");
    file.write_str(&config::to_yaml(&original).expect("render"))
        .expect("write");

    assert_eq!(config::load_at(file.path()).expect("reload"), original);
}

// ---------------------------------------------------------------------------
// 3. Parse and validation errors
// ---------------------------------------------------------------------------

#[test]
fn corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "got: {err}");
}

#[test]
fn unknown_key_is_a_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str("triger: typo\n").expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[rstest]
#[case("trigger: \"\"\n", "trigger")]
#[case("capture:\n  timeout_secs: 0\n", "capture.timeout_secs")]
#[case("capture:\n  command: []\n", "capture.command")]
#[case("capture:\n  command: [\"fswebcam\", \"/tmp/fixed.jpg\"]\n", "capture.command")]
#[case("log_source:\n  command: []\n", "log_source.command")]
#[case("artifacts:\n  prefix: \"a/b\"\n", "artifacts.prefix")]
#[case("artifacts:\n  extension: \"\"\n", "artifacts.extension")]
fn invalid_values_are_rejected(#[case] yaml: &str, #[case] expected_field: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(yaml).expect("write");

    let err = config::load_at(file.path()).unwrap_err();
    match err {
        ConfigError::Invalid { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected Invalid for {expected_field}, got: {other}"),
    }
}
