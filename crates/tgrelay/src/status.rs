// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tgrelay status` command implementation.
//!
//! Reads the connection-status and control-state rows straight from the
//! repository; the serve process keeps them current.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tgrelay_config::model::TgrelayConfig;
use tgrelay_core::{RelayError, Repository};
use tgrelay_storage::SqliteRepository;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
struct StatusResponse {
    enabled: bool,
    connected: bool,
    restart_requested_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_event_time: Option<DateTime<Utc>>,
    last_event_message: Option<String>,
}

/// Run the `tgrelay status` command.
pub async fn run_status(config: &TgrelayConfig, json: bool) -> Result<(), RelayError> {
    let repo = SqliteRepository::new(config.storage.clone());
    repo.initialize().await?;

    let control = repo.control_state().await?;
    let status = repo.status().await?;
    repo.close().await?;

    let response = StatusResponse {
        enabled: control.enabled,
        connected: status.connected,
        restart_requested_at: control.restart_requested_at,
        last_error: status.last_error,
        last_event_time: status.last_event_time,
        last_event_message: status.last_event_message,
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
        return Ok(());
    }

    println!();
    println!("  tgrelay status");
    println!("  {}", "-".repeat(35));
    println!(
        "    Monitoring: {}",
        if response.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "    Connection: {}",
        if response.connected {
            "connected"
        } else {
            "disconnected"
        }
    );
    if let Some(error) = &response.last_error {
        println!("    Last error: {error}");
    }
    match (&response.last_event_time, &response.last_event_message) {
        (Some(when), Some(message)) => println!("    Last event: [{when}] {message}"),
        (None, Some(message)) => println!("    Last event: {message}"),
        _ => println!("    Last event: none"),
    }
    println!();

    Ok(())
}
