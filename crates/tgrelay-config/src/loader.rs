// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tgrelay.toml` > `~/.config/tgrelay/tgrelay.toml`
//! > `/etc/tgrelay/tgrelay.toml` with environment variable overrides via the
//! `TGRELAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TgrelayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tgrelay/tgrelay.toml` (system-wide)
/// 3. `~/.config/tgrelay/tgrelay.toml` (user XDG config)
/// 4. `./tgrelay.toml` (local directory)
/// 5. `TGRELAY_*` environment variables
pub fn load_config() -> Result<TgrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TgrelayConfig::default()))
        .merge(Toml::file("/etc/tgrelay/tgrelay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tgrelay/tgrelay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tgrelay.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TgrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TgrelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TgrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TgrelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TGRELAY_TELEGRAM_API_HASH` must map to
/// `telegram.api_hash`, not `telegram.api.hash`.
fn env_provider() -> Env {
    Env::prefixed("TGRELAY_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: TGRELAY_TELEGRAM_API_HASH -> "telegram_api_hash"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("telegram_", "telegram.", 1)
            .replacen("monitor_", "monitor.", 1)
            .replacen("retention_", "retention.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("runtime_", "runtime.", 1);
        mapped.into()
    })
}
