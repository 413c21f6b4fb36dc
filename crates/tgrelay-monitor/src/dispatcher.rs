// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live event dispatcher: per-event filtering, status previews, and the
//! keyword-relay path.
//!
//! Installed once per connection by the supervisor. Each event is isolated:
//! a failure while processing one message is reported as an error event and
//! never ends the update pump. Relays always go through the ledger's atomic
//! claim; the dispatcher may run concurrently with the supervisor tick, and
//! an in-memory check could double-process a message.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use tracing::{debug, error};

use tgrelay_core::text::{normalize, preview};
use tgrelay_core::{ChatEvent, Gateway, RelayError, Repository, ResolvedTarget};

/// What the dispatcher did with one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Event carried no chat identifier.
    SkippedNoChat,
    /// Chat is a private dialog, not a group or channel.
    SkippedNotMonitorable,
    /// Chat is the relay destination itself (loop protection).
    SkippedTarget,
    /// Preview recorded; no keyword matched.
    Logged,
    /// Keyword matched and the message was forwarded.
    Relayed,
    /// Keyword matched but another claim owns or finished this message.
    SkippedClaimed,
    /// Keyword matched, claim granted, but the forward call failed.
    RelayFailed,
}

/// Per-connection event handler.
pub struct EventDispatcher {
    repo: Arc<dyn Repository>,
    target: Arc<ArcSwapOption<ResolvedTarget>>,
    retry_after: Duration,
    preview_max_chars: usize,
}

impl EventDispatcher {
    pub fn new(
        repo: Arc<dyn Repository>,
        target: Arc<ArcSwapOption<ResolvedTarget>>,
        retry_after: Duration,
        preview_max_chars: usize,
    ) -> Self {
        Self {
            repo,
            target,
            retry_after,
            preview_max_chars,
        }
    }

    /// Handle one inbound event, isolating any failure to this event.
    pub async fn handle_event(&self, gateway: &dyn Gateway, event: ChatEvent) -> DispatchOutcome {
        match self.process(gateway, &event).await {
            Ok(outcome) => {
                debug!(chat_id = ?event.chat_id, message_id = event.message_id, ?outcome, "event handled");
                outcome
            }
            Err(e) => {
                error!(error = %e, message_id = event.message_id, "event handler failed");
                if let Err(report_err) = self
                    .repo
                    .error_event_add(&format!("event handler error: {e}"))
                    .await
                {
                    error!(error = %report_err, "failed to report handler error");
                }
                DispatchOutcome::RelayFailed
            }
        }
    }

    async fn process(
        &self,
        gateway: &dyn Gateway,
        event: &ChatEvent,
    ) -> Result<DispatchOutcome, RelayError> {
        let Some(chat_id) = event.chat_id else {
            return Ok(DispatchOutcome::SkippedNoChat);
        };

        if !event.kind.is_some_and(|kind| kind.is_monitorable()) {
            return Ok(DispatchOutcome::SkippedNotMonitorable);
        }

        // One consistent snapshot of the resolved target for this event.
        let target = self.target.load_full();
        if target.as_deref().is_some_and(|t| t.chat_id == chat_id) {
            // The relay destination is never a monitoring source; treating
            // it as one would re-forward every relayed message forever.
            return Ok(DispatchOutcome::SkippedTarget);
        }

        let body = preview(&event.text, self.preview_max_chars);
        let when = event.date.unwrap_or_else(Utc::now);
        self.repo
            .status_set_event(when, &format!("chat {chat_id} message {}: {body}", event.message_id))
            .await?;

        if let Some(target) = target.as_deref()
            && self.matches_keywords(&event.text).await?
        {
            return self.relay(gateway, chat_id, event, target).await;
        }

        self.advance_checkpoint(chat_id, event).await?;
        Ok(DispatchOutcome::Logged)
    }

    async fn matches_keywords(&self, text: &str) -> Result<bool, RelayError> {
        let keywords = self.repo.keywords_normalized().await?;
        if keywords.is_empty() {
            return Ok(false);
        }
        let haystack = normalize(text);
        Ok(keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && haystack.contains(keyword.as_str())))
    }

    /// Run the claim/commit protocol around the actual forward call.
    async fn relay(
        &self,
        gateway: &dyn Gateway,
        chat_id: i64,
        event: &ChatEvent,
        target: &ResolvedTarget,
    ) -> Result<DispatchOutcome, RelayError> {
        if !self
            .repo
            .ledger_claim(chat_id, event.message_id, self.retry_after)
            .await?
        {
            // Not an error: another attempt owns or already finished this
            // message.
            return Ok(DispatchOutcome::SkippedClaimed);
        }

        match gateway
            .forward_message(chat_id, event.message_id, target.chat_id)
            .await
        {
            Ok(()) => {
                self.repo
                    .ledger_mark_sent(chat_id, event.message_id)
                    .await?;
                self.advance_checkpoint(chat_id, event).await?;
                Ok(DispatchOutcome::Relayed)
            }
            Err(e) => {
                self.repo
                    .ledger_mark_failed(chat_id, event.message_id, &e.to_string())
                    .await?;
                self.repo
                    .error_event_add(&format!(
                        "forward of message {} from chat {chat_id} failed: {e}",
                        event.message_id
                    ))
                    .await?;
                Ok(DispatchOutcome::RelayFailed)
            }
        }
    }

    /// Upsert the chat's checkpoint, never moving it backwards.
    async fn advance_checkpoint(&self, chat_id: i64, event: &ChatEvent) -> Result<(), RelayError> {
        if let Some(existing) = self.repo.checkpoint_get(chat_id).await?
            && existing.last_message_id >= event.message_id
        {
            return Ok(());
        }
        self.repo
            .checkpoint_upsert(chat_id, event.message_id, event.date)
            .await
    }
}
