// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `Repository` implementation for deterministic tests.
//!
//! Mirrors the SQLite claim semantics and additionally counts status writes,
//! so tests can assert that the supervisor deduplicates durable writes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tgrelay_core::{
    Checkpoint, CleanupReport, ConnectionStatus, ControlState, ForwardStatus, RelayError,
    Repository,
};

#[derive(Debug, Clone)]
struct LedgerEntry {
    status: ForwardStatus,
    claimed_at: DateTime<Utc>,
    fail_count: u32,
    last_error: Option<String>,
}

/// In-memory repository with injectable control state and write counters.
#[derive(Default)]
pub struct MemoryRepository {
    control: Mutex<Option<ControlState>>,
    status: Mutex<ConnectionStatus>,
    ledger: Mutex<HashMap<(i64, i64), LedgerEntry>>,
    checkpoints: Mutex<HashMap<i64, Checkpoint>>,
    keywords: Mutex<Vec<String>>,
    events: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    cleanup_calls: Mutex<Vec<(u32, u32)>>,
    connected_writes: AtomicUsize,
    error_writes: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // --- test-side state injection ---

    pub fn set_enabled(&self, enabled: bool) {
        let mut control = self.control.lock().unwrap();
        let state = control.get_or_insert(ControlState {
            enabled: false,
            restart_requested_at: None,
        });
        state.enabled = enabled;
    }

    pub fn request_restart(&self, at: DateTime<Utc>) {
        let mut control = self.control.lock().unwrap();
        let state = control.get_or_insert(ControlState {
            enabled: false,
            restart_requested_at: None,
        });
        state.restart_requested_at = Some(at);
    }

    pub fn set_keywords(&self, keywords: &[&str]) {
        *self.keywords.lock().unwrap() =
            keywords.iter().map(|k| k.to_string()).collect();
    }

    // --- test-side observation ---

    pub fn snapshot_status(&self) -> ConnectionStatus {
        self.status.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn error_events(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn connected_write_count(&self) -> usize {
        self.connected_writes.load(Ordering::SeqCst)
    }

    pub fn error_write_count(&self) -> usize {
        self.error_writes.load(Ordering::SeqCst)
    }

    pub fn cleanup_calls(&self) -> Vec<(u32, u32)> {
        self.cleanup_calls.lock().unwrap().clone()
    }

    pub fn ledger_status(&self, chat_id: i64, message_id: i64) -> Option<ForwardStatus> {
        self.ledger
            .lock()
            .unwrap()
            .get(&(chat_id, message_id))
            .map(|e| e.status)
    }

    pub fn ledger_fail_count(&self, chat_id: i64, message_id: i64) -> Option<u32> {
        self.ledger
            .lock()
            .unwrap()
            .get(&(chat_id, message_id))
            .map(|e| e.fail_count)
    }

    pub fn ledger_last_error(&self, chat_id: i64, message_id: i64) -> Option<String> {
        self.ledger
            .lock()
            .unwrap()
            .get(&(chat_id, message_id))
            .and_then(|e| e.last_error.clone())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn control_state(&self) -> Result<ControlState, RelayError> {
        // First read creates the default row, like the durable store.
        let mut control = self.control.lock().unwrap();
        Ok(control
            .get_or_insert(ControlState {
                enabled: false,
                restart_requested_at: None,
            })
            .clone())
    }

    async fn status_set_connected(&self, connected: bool) -> Result<(), RelayError> {
        self.connected_writes.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().connected = connected;
        Ok(())
    }

    async fn status_set_error(&self, error: Option<&str>) -> Result<(), RelayError> {
        self.error_writes.fetch_add(1, Ordering::SeqCst);
        self.status.lock().unwrap().last_error = error.map(str::to_string);
        Ok(())
    }

    async fn status_set_event(
        &self,
        when: DateTime<Utc>,
        message: &str,
    ) -> Result<(), RelayError> {
        let mut status = self.status.lock().unwrap();
        status.last_event_time = Some(when);
        status.last_event_message = Some(message.to_string());
        self.events.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn status(&self) -> Result<ConnectionStatus, RelayError> {
        Ok(self.snapshot_status())
    }

    async fn ledger_claim(
        &self,
        chat_id: i64,
        message_id: i64,
        retry_after: Duration,
    ) -> Result<bool, RelayError> {
        let now = Utc::now();
        let retry_after = chrono::Duration::seconds(retry_after.as_secs().max(1) as i64);
        let mut ledger = self.ledger.lock().unwrap();

        let granted = match ledger.get_mut(&(chat_id, message_id)) {
            None => {
                ledger.insert(
                    (chat_id, message_id),
                    LedgerEntry {
                        status: ForwardStatus::Pending,
                        claimed_at: now,
                        fail_count: 0,
                        last_error: None,
                    },
                );
                true
            }
            Some(entry) if entry.status == ForwardStatus::Sent => false,
            Some(entry) => {
                let expired = now.signed_duration_since(entry.claimed_at) >= retry_after;
                if expired {
                    entry.status = ForwardStatus::Pending;
                    entry.claimed_at = now;
                }
                expired
            }
        };
        Ok(granted)
    }

    async fn ledger_mark_sent(&self, chat_id: i64, message_id: i64) -> Result<(), RelayError> {
        if let Some(entry) = self.ledger.lock().unwrap().get_mut(&(chat_id, message_id)) {
            entry.status = ForwardStatus::Sent;
        }
        Ok(())
    }

    async fn ledger_mark_failed(
        &self,
        chat_id: i64,
        message_id: i64,
        error: &str,
    ) -> Result<(), RelayError> {
        if let Some(entry) = self.ledger.lock().unwrap().get_mut(&(chat_id, message_id)) {
            entry.status = ForwardStatus::Failed;
            entry.fail_count += 1;
            entry.last_error = Some(error.to_string());
        }
        Ok(())
    }

    async fn checkpoint_get(&self, chat_id: i64) -> Result<Option<Checkpoint>, RelayError> {
        Ok(self.checkpoints.lock().unwrap().get(&chat_id).copied())
    }

    async fn checkpoint_upsert(
        &self,
        chat_id: i64,
        message_id: i64,
        date: Option<DateTime<Utc>>,
    ) -> Result<(), RelayError> {
        self.checkpoints.lock().unwrap().insert(
            chat_id,
            Checkpoint {
                last_message_id: message_id,
                last_message_date: date,
            },
        );
        Ok(())
    }

    async fn error_event_add(&self, message: &str) -> Result<(), RelayError> {
        self.errors.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn keywords_normalized(&self) -> Result<Vec<String>, RelayError> {
        Ok(self.keywords.lock().unwrap().clone())
    }

    async fn cleanup(
        &self,
        error_retention_days: u32,
        ledger_retention_days: u32,
    ) -> Result<CleanupReport, RelayError> {
        self.cleanup_calls
            .lock()
            .unwrap()
            .push((error_retention_days, ledger_retention_days));
        Ok(CleanupReport {
            error_events_deleted: 2,
            ledger_rows_deleted: 5,
        })
    }
}
