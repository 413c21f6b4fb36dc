// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository trait: the durable store consumed by every monitor component.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::RelayError;
use crate::types::{Checkpoint, CleanupReport, ConnectionStatus, ControlState};

/// Abstract durable store for control flags, status, idempotent forward
/// claims, channel checkpoints, error events, and the keyword set.
///
/// All methods are ordinary committed operations; the only one with
/// special atomicity requirements is [`ledger_claim`](Self::ledger_claim),
/// which must read and update the keyed row in a single transaction.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- control / status ---

    /// Read the admin control switches. Implementations return the default
    /// (disabled, no restart requested) when no row exists yet.
    async fn control_state(&self) -> Result<ControlState, RelayError>;

    async fn status_set_connected(&self, connected: bool) -> Result<(), RelayError>;

    /// Set or clear the last connection error. Implementations truncate to
    /// 4000 characters.
    async fn status_set_error(&self, error: Option<&str>) -> Result<(), RelayError>;

    /// Record the latest noteworthy event (resolution, inbound preview,
    /// cleanup summary, lifecycle transitions).
    async fn status_set_event(&self, when: DateTime<Utc>, message: &str)
    -> Result<(), RelayError>;

    /// Read the full status row, for the admin seam.
    async fn status(&self) -> Result<ConnectionStatus, RelayError>;

    // --- idempotent forwarding ledger ---

    /// Attempt to claim `(chat_id, message_id)` for processing.
    ///
    /// Returns `true` only when the caller is cleared to process, and must
    /// then finish with [`ledger_mark_sent`](Self::ledger_mark_sent) or
    /// [`ledger_mark_failed`](Self::ledger_mark_failed). Returns `false`
    /// when the message was already sent, or another unexpired claim owns
    /// it. Claims older than `retry_after` are re-claimable, which tolerates
    /// a claimant crashing mid-work.
    async fn ledger_claim(
        &self,
        chat_id: i64,
        message_id: i64,
        retry_after: Duration,
    ) -> Result<bool, RelayError>;

    /// Mark the claim as sent. Terminal: the message is never reprocessed.
    async fn ledger_mark_sent(&self, chat_id: i64, message_id: i64) -> Result<(), RelayError>;

    /// Mark the claim as failed, incrementing the failure counter and
    /// recording a truncated error. Eligible for retry after the timeout.
    async fn ledger_mark_failed(
        &self,
        chat_id: i64,
        message_id: i64,
        error: &str,
    ) -> Result<(), RelayError>;

    // --- channel checkpoints ---

    async fn checkpoint_get(&self, chat_id: i64) -> Result<Option<Checkpoint>, RelayError>;

    async fn checkpoint_upsert(
        &self,
        chat_id: i64,
        message_id: i64,
        date: Option<DateTime<Utc>>,
    ) -> Result<(), RelayError>;

    // --- error events / keywords / retention ---

    /// Append one error event. Implementations truncate to 4000 characters.
    async fn error_event_add(&self, message: &str) -> Result<(), RelayError>;

    /// The keyword set in normalized form. Owned by the admin layer;
    /// read-only to the monitor.
    async fn keywords_normalized(&self) -> Result<Vec<String>, RelayError>;

    /// Delete error events and ledger rows older than the given day counts,
    /// returning how many rows each delete removed.
    async fn cleanup(
        &self,
        error_retention_days: u32,
        ledger_retention_days: u32,
    ) -> Result<CleanupReport, RelayError>;
}
