// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the seam traits and the tgrelay workspace.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Admin-controlled switches the supervisor polls every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Whether monitoring should be running at all.
    pub enabled: bool,
    /// Soft-restart signal: strictly increases on each new restart request.
    /// A change relative to the last observed value drops the connection.
    pub restart_requested_at: Option<DateTime<Utc>>,
}

/// Connection status row surfaced to the admin layer. Written only by the
/// supervisor and the event dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub last_error: Option<String>,
    pub last_event_time: Option<DateTime<Utc>>,
    pub last_event_message: Option<String>,
}

/// Lifecycle of a forward-ledger row. `Sent` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum ForwardStatus {
    Pending,
    Sent,
    Failed,
}

/// Kind of chat a dialog or event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

impl ChatKind {
    /// Only groups and channels are monitoring sources; one-to-one dialogs
    /// are out of scope.
    pub fn is_monitorable(self) -> bool {
        matches!(self, Self::Group | Self::Channel)
    }
}

/// One entry from the account's dialog list, as seen by the title resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogInfo {
    pub chat_id: i64,
    pub title: String,
    pub kind: ChatKind,
}

/// An inbound message notification delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    /// Absent when the transport could not attribute the event to a chat.
    pub chat_id: Option<i64>,
    pub kind: Option<ChatKind>,
    pub message_id: i64,
    pub text: String,
    pub date: Option<DateTime<Utc>>,
}

/// Last processed message marker for one monitored chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub last_message_id: i64,
    pub last_message_date: Option<DateTime<Utc>>,
}

/// Row counts removed by one retention-cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub error_events_deleted: u64,
    pub ledger_rows_deleted: u64,
}

/// The resolved relay destination, cached by the supervisor for the
/// lifetime of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub chat_id: i64,
    pub title: String,
}

/// Fully validated account credentials handed to the gateway connector.
///
/// Produced from the optional config fields by connect-time validation;
/// the connector never sees a partially configured account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSettings {
    pub api_id: i32,
    pub api_hash: String,
    pub session_file: PathBuf,
    pub target_title: String,
}
