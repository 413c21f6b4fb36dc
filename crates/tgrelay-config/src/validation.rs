// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Account credentials are intentionally NOT checked here: their
//! absence is a connect-time status error handled by the supervisor, not a
//! startup failure.

use crate::diagnostic::ConfigError;
use crate::model::TgrelayConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TgrelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.monitor.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "monitor.poll_interval_secs must be at least 1".to_string(),
        });
    }

    if config.monitor.retry_after_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "monitor.retry_after_secs must be at least 1".to_string(),
        });
    }

    if config.monitor.preview_max_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "monitor.preview_max_chars must be at least 1".to_string(),
        });
    }

    if config.retention.cleanup_hour_utc > 23 {
        errors.push(ConfigError::Validation {
            message: format!(
                "retention.cleanup_hour_utc must be 0-23, got {}",
                config.retention.cleanup_hour_utc
            ),
        });
    }

    if config.retention.error_log_days == 0 {
        errors.push(ConfigError::Validation {
            message: "retention.error_log_days must be at least 1".to_string(),
        });
    }

    if config.retention.ledger_days == 0 {
        errors.push(ConfigError::Validation {
            message: "retention.ledger_days must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = TgrelayConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn missing_credentials_still_validate() {
        // Unset account fields are a connect-time concern, not a startup one.
        let config = TgrelayConfig::default();
        assert!(config.telegram.api_id.is_none());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = TgrelayConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let mut config = TgrelayConfig::default();
        config.monitor.poll_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("poll_interval_secs"))
        ));
    }

    #[test]
    fn out_of_range_cleanup_hour_fails_validation() {
        let mut config = TgrelayConfig::default();
        config.retention.cleanup_hour_utc = 24;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("cleanup_hour_utc"))
        ));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = TgrelayConfig::default();
        config.retention.error_log_days = 0;
        config.retention.ledger_days = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
