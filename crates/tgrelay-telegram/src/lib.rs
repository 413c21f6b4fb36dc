// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MTProto gateway for the tgrelay monitor, built on grammers.
//!
//! Implements the core [`Gateway`]/[`GatewayConnector`] seam over a user
//! account session: session-file authorization, dialog iteration for title
//! resolution, the live update stream, and message forwarding. This is the
//! only crate that touches the wire protocol.

use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use grammers_client::session::{PackedChat, Session};
use grammers_client::types::Chat;
use grammers_client::{Client, Config, InitParams, Update};
use tracing::{debug, warn};

use tgrelay_core::{
    AccountSettings, ChatEvent, ChatKind, DialogInfo, Gateway, GatewayConnector, RelayError,
};

/// Builds live [`TelegramGateway`] sessions from validated account settings.
pub struct TelegramConnector;

impl TelegramConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TelegramConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayConnector for TelegramConnector {
    async fn connect(&self, account: &AccountSettings) -> Result<Box<dyn Gateway>, RelayError> {
        // The supervisor validated existence; a file that fails to parse is
        // still a configuration problem, not a transport one.
        let session = Session::load_file(&account.session_file).map_err(|e| {
            RelayError::Config(format!(
                "failed to load session file `{}`: {e}",
                account.session_file.display()
            ))
        })?;

        let client = Client::connect(Config {
            session,
            api_id: account.api_id,
            api_hash: account.api_hash.clone(),
            params: InitParams {
                // Deliver updates missed while disconnected.
                catch_up: true,
                ..Default::default()
            },
        })
        .await
        .map_err(|e| RelayError::transport("failed to connect to Telegram", e))?;

        debug!(session = %account.session_file.display(), "telegram client connected");

        Ok(Box::new(TelegramGateway {
            client,
            session_file: account.session_file.clone(),
            chats: DashMap::new(),
        }))
    }
}

/// One live account session.
///
/// Forwarding needs access-hash-carrying chat references, so every chat seen
/// in the dialog scan or the update stream is kept packed by id.
pub struct TelegramGateway {
    client: Client,
    session_file: PathBuf,
    chats: DashMap<i64, PackedChat>,
}

impl TelegramGateway {
    fn remember(&self, chat: &Chat) {
        self.chats.insert(chat.id(), chat.pack());
    }

    fn packed(&self, chat_id: i64) -> Result<PackedChat, RelayError> {
        self.chats
            .get(&chat_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| {
                RelayError::transport_msg(format!("chat {chat_id} is not in the dialog cache"))
            })
    }

    fn save_session(&self) -> Result<(), RelayError> {
        self.client
            .session()
            .save_to_file(&self.session_file)
            .map_err(|e| {
                RelayError::Internal(format!(
                    "failed to save session file `{}`: {e}",
                    self.session_file.display()
                ))
            })
    }
}

fn chat_kind(chat: &Chat) -> ChatKind {
    match chat {
        Chat::User(_) => ChatKind::Private,
        Chat::Group(_) => ChatKind::Group,
        Chat::Channel(_) => ChatKind::Channel,
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn is_authorized(&self) -> Result<bool, RelayError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| RelayError::transport("authorization check failed", e))
    }

    async fn sync_missed_updates(&self) -> Result<(), RelayError> {
        // Catch-up itself was requested at connect time; persisting the
        // update state here makes the next connect resume from this point.
        self.client.sync_update_state();
        self.save_session()
    }

    async fn dialogs(&self) -> Result<Vec<DialogInfo>, RelayError> {
        let mut iter = self.client.iter_dialogs();
        let mut dialogs = Vec::new();
        while let Some(dialog) = iter
            .next()
            .await
            .map_err(|e| RelayError::transport("dialog list failed", e))?
        {
            let chat = dialog.chat();
            self.remember(chat);
            let title = match chat {
                Chat::User(user) => user.full_name(),
                Chat::Group(group) => group.title().to_string(),
                Chat::Channel(channel) => channel.title().to_string(),
            };
            dialogs.push(DialogInfo {
                chat_id: chat.id(),
                title,
                kind: chat_kind(chat),
            });
        }
        debug!(count = dialogs.len(), "dialog list fetched");
        Ok(dialogs)
    }

    async fn next_event(&self) -> Result<ChatEvent, RelayError> {
        loop {
            let update = self
                .client
                .next_update()
                .await
                .map_err(|e| RelayError::transport("update stream failed", e))?;

            if let Update::NewMessage(message) = update {
                if message.outgoing() {
                    continue;
                }
                let chat = message.chat();
                self.remember(&chat);
                return Ok(ChatEvent {
                    chat_id: Some(chat.id()),
                    kind: Some(chat_kind(&chat)),
                    message_id: i64::from(message.id()),
                    text: message.text().to_string(),
                    date: Some(message.date()),
                });
            }
        }
    }

    async fn forward_message(
        &self,
        source_chat_id: i64,
        message_id: i64,
        target_chat_id: i64,
    ) -> Result<(), RelayError> {
        let source = self.packed(source_chat_id)?;
        let target = self.packed(target_chat_id)?;
        let message_id = i32::try_from(message_id).map_err(|_| {
            RelayError::Internal(format!("message id {message_id} out of range"))
        })?;

        self.client
            .forward_messages(target, &[message_id], source)
            .await
            .map_err(|e| RelayError::transport("forward failed", e))?;
        Ok(())
    }

    async fn disconnect(&self) {
        self.client.sync_update_state();
        if let Err(e) = self.save_session() {
            warn!(error = %e, "session save on disconnect failed");
        }
        // The underlying connection closes when the last client handle is
        // dropped by the supervisor.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_rejects_unreadable_session_without_network() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where a session file is expected: load fails before
        // any network traffic.
        let account = AccountSettings {
            api_id: 1,
            api_hash: "hash".into(),
            session_file: dir.path().to_path_buf(),
            target_title: "Target".into(),
        };

        let err = match TelegramConnector::new().connect(&account).await {
            Ok(_) => panic!("expected connect to fail without a readable session"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), tgrelay_core::ErrorKind::Configuration);
    }
}
