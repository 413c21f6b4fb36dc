// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway traits: the messaging-backend client owned by the supervisor.
//!
//! The wire protocol itself lives behind these traits; the monitor never
//! touches it. One [`GatewayConnector`] builds one live [`Gateway`] per
//! connection cycle, and the supervisor discards the handle on every
//! disconnect path.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{AccountSettings, ChatEvent, DialogInfo};

/// A live, connected account session.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Whether the underlying session is authorized. `false` means the
    /// session file is stale and a fresh login is required out of band.
    async fn is_authorized(&self) -> Result<bool, RelayError>;

    /// Best-effort synchronization of updates missed while disconnected.
    /// Callers treat failure as non-fatal.
    async fn sync_missed_updates(&self) -> Result<(), RelayError>;

    /// The account's full dialog list, for target-title resolution.
    async fn dialogs(&self) -> Result<Vec<DialogInfo>, RelayError>;

    /// Next inbound message notification. An error here ends the
    /// connection lifecycle; the supervisor reconnects.
    async fn next_event(&self) -> Result<ChatEvent, RelayError>;

    /// Forward one message from a source chat to the target chat.
    async fn forward_message(
        &self,
        source_chat_id: i64,
        message_id: i64,
        target_chat_id: i64,
    ) -> Result<(), RelayError>;

    /// Cooperative disconnect. Callers bound this with a timeout and
    /// swallow failures; correctness is re-established on the next connect.
    async fn disconnect(&self);
}

/// Factory that turns validated account settings into a live [`Gateway`].
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(&self, account: &AccountSettings) -> Result<Box<dyn Gateway>, RelayError>;
}
