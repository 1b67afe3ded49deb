//! Integration tests for configuration loading

use checkin_gate::infra::{Config, LookupFailurePolicy};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[admission]
radius_meters = 500.0
max_retries = 3
retry_delay_ms = 250

[store]
collection = "test_checkins"

[attendees]
lookup_failure = "collect"

[compat]
degrade_is_checked_in = true
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.radius_meters(), 500.0);
    assert_eq!(config.max_retries(), 3);
    assert_eq!(config.retry_delay_ms(), 250);
    assert_eq!(config.collection(), "test_checkins");
    assert_eq!(config.lookup_failure(), LookupFailurePolicy::Collect);
    assert!(config.degrade_is_checked_in());
}

#[test]
fn test_partial_file_fills_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[admission]
radius_meters = 800.0
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.radius_meters(), 800.0);
    // Everything else falls back to defaults
    assert_eq!(config.max_retries(), 1);
    assert_eq!(config.retry_delay_ms(), 2_000);
    assert_eq!(config.collection(), "checkins");
    assert_eq!(config.lookup_failure(), LookupFailurePolicy::Skip);
    assert!(!config.degrade_is_checked_in());
}

#[test]
fn test_load_from_path_fallback() {
    // Nonexistent file falls back to defaults instead of failing
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.radius_meters(), 1_609.344);
    assert_eq!(config.collection(), "checkins");
}

#[test]
fn test_from_file_missing_is_error() {
    assert!(Config::from_file("/nonexistent/config.toml").is_err());
}

#[test]
fn test_from_file_invalid_toml_is_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"not valid toml [[[").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}
