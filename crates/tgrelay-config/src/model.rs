// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the tgrelay monitor.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Account credentials are deliberately optional
//! here: their presence is validated at connect time by the supervisor, so
//! an unconfigured account is a recoverable status error rather than a
//! startup failure.

use serde::{Deserialize, Serialize};

/// Top-level tgrelay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TgrelayConfig {
    /// Telegram account session settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Supervisor poll/backoff tuning.
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Retention cleanup schedule and windows.
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Process-level runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Telegram account configuration. Every field is required for a connection
/// attempt, but none is required at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Application id issued by my.telegram.org.
    #[serde(default)]
    pub api_id: Option<i32>,

    /// Application hash paired with `api_id`.
    #[serde(default)]
    pub api_hash: Option<String>,

    /// Path to the MTProto session file produced by the login tool.
    #[serde(default)]
    pub session_file: Option<String>,

    /// Human-readable title of the relay destination channel.
    #[serde(default)]
    pub target_title: Option<String>,
}

/// Supervisor loop tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Control-state poll interval, also the soft-failure backoff.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Backoff after a failed connection attempt.
    #[serde(default = "default_connect_backoff_secs")]
    pub connect_backoff_secs: u64,

    /// How long a forward claim stays exclusive before it may be retried.
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,

    /// Maximum characters of message body kept in the status preview.
    #[serde(default = "default_preview_max_chars")]
    pub preview_max_chars: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            connect_backoff_secs: default_connect_backoff_secs(),
            retry_after_secs: default_retry_after_secs(),
            preview_max_chars: default_preview_max_chars(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_connect_backoff_secs() -> u64 {
    3
}

fn default_retry_after_secs() -> u64 {
    60
}

fn default_preview_max_chars() -> usize {
    120
}

/// Retention cleanup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// UTC wall-clock hour at which the daily cleanup runs.
    #[serde(default = "default_cleanup_hour_utc")]
    pub cleanup_hour_utc: u32,

    /// Error-log rows older than this many days are deleted.
    #[serde(default = "default_error_log_days")]
    pub error_log_days: u32,

    /// Forward-ledger rows older than this many days are deleted.
    #[serde(default = "default_ledger_days")]
    pub ledger_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            cleanup_hour_utc: default_cleanup_hour_utc(),
            error_log_days: default_error_log_days(),
            ledger_days: default_ledger_days(),
        }
    }
}

fn default_cleanup_hour_utc() -> u32 {
    4
}

fn default_error_log_days() -> u32 {
    7
}

fn default_ledger_days() -> u32 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tgrelay").join("tgrelay.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("tgrelay.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Process-level runtime settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
