// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading, env overrides, and
//! validation error reporting.

use serial_test::serial;
use tgrelay_config::{ConfigError, load_and_validate_str, load_config_from_path};

#[test]
fn toml_sections_override_defaults() {
    let config = load_and_validate_str(
        r#"
[monitor]
poll_interval_secs = 2
retry_after_secs = 120

[retention]
cleanup_hour_utc = 3
"#,
    )
    .unwrap();

    assert_eq!(config.monitor.poll_interval_secs, 2);
    assert_eq!(config.monitor.retry_after_secs, 120);
    assert_eq!(config.monitor.connect_backoff_secs, 3); // untouched default
    assert_eq!(config.retention.cleanup_hour_utc, 3);
}

#[test]
fn validation_errors_surface_from_toml() {
    let errors = load_and_validate_str(
        r#"
[retention]
error_log_days = 0
"#,
    )
    .unwrap_err();

    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("error_log_days"))
    ));
}

#[test]
fn unknown_section_key_is_diagnosed() {
    let errors = load_and_validate_str(
        r#"
[storage]
databse_path = "/tmp/x.db"
"#,
    )
    .unwrap_err();

    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion, .. }
            if key == "databse_path" && suggestion.as_deref() == Some("database_path")
    )));
}

#[test]
#[serial]
fn env_vars_override_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tgrelay.toml");
    std::fs::write(
        &path,
        r#"
[telegram]
api_id = 111
target_title = "From File"
"#,
    )
    .unwrap();

    // SAFETY: serialized by #[serial]; no other thread reads the
    // environment while these tests run.
    unsafe {
        std::env::set_var("TGRELAY_TELEGRAM_API_ID", "222");
        std::env::set_var("TGRELAY_TELEGRAM_API_HASH", "deadbeef");
    }

    let config = load_config_from_path(&path).unwrap();

    unsafe {
        std::env::remove_var("TGRELAY_TELEGRAM_API_ID");
        std::env::remove_var("TGRELAY_TELEGRAM_API_HASH");
    }

    assert_eq!(config.telegram.api_id, Some(222));
    assert_eq!(config.telegram.api_hash.as_deref(), Some("deadbeef"));
    // Values not overridden by env keep the file layer.
    assert_eq!(config.telegram.target_title.as_deref(), Some("From File"));
}

#[test]
#[serial]
fn env_mapping_keeps_underscores_inside_key_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tgrelay.toml");
    std::fs::write(&path, "").unwrap();

    unsafe {
        std::env::set_var("TGRELAY_TELEGRAM_SESSION_FILE", "acc.session");
        std::env::set_var("TGRELAY_RETENTION_CLEANUP_HOUR_UTC", "6");
    }

    let config = load_config_from_path(&path).unwrap();

    unsafe {
        std::env::remove_var("TGRELAY_TELEGRAM_SESSION_FILE");
        std::env::remove_var("TGRELAY_RETENTION_CLEANUP_HOUR_UTC");
    }

    assert_eq!(config.telegram.session_file.as_deref(), Some("acc.session"));
    assert_eq!(config.retention.cleanup_hour_utc, 6);
}
