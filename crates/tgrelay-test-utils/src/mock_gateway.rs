// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted mock gateway and connector.
//!
//! `MockGateway` provides two queues in the style of the transport it
//! doubles for: injected inbound events are returned by `next_event()`, and
//! forwarded messages are captured for assertion. `MockConnector` hands the
//! shared gateway to the supervisor and can be scripted to fail a number of
//! connection attempts first.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use tgrelay_core::{
    AccountSettings, ChatEvent, DialogInfo, Gateway, GatewayConnector, RelayError,
};

/// A mock account session for testing.
#[derive(Default)]
pub struct MockGateway {
    authorized: AtomicBool,
    sync_fails: AtomicBool,
    forward_fails: AtomicBool,
    dead: AtomicBool,
    dialogs: Mutex<Vec<DialogInfo>>,
    inbound: Mutex<VecDeque<ChatEvent>>,
    notify: Notify,
    forwarded: Mutex<Vec<(i64, i64, i64)>>,
    disconnects: AtomicUsize,
    sync_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        let gateway = Arc::new(Self::default());
        gateway.authorized.store(true, Ordering::SeqCst);
        gateway
    }

    pub fn set_authorized(&self, authorized: bool) {
        self.authorized.store(authorized, Ordering::SeqCst);
    }

    pub fn set_sync_fails(&self, fails: bool) {
        self.sync_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_forward_fails(&self, fails: bool) {
        self.forward_fails.store(fails, Ordering::SeqCst);
    }

    /// Make `next_event` return a transport error, ending the update pump.
    pub fn kill_stream(&self) {
        self.dead.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn set_dialogs(&self, dialogs: Vec<DialogInfo>) {
        *self.dialogs.lock().unwrap() = dialogs;
    }

    /// Inject an inbound event; the next call to `next_event()` returns it.
    pub fn inject_event(&self, event: ChatEvent) {
        self.inbound.lock().unwrap().push_back(event);
        self.notify.notify_one();
    }

    /// All `(source_chat, message, target_chat)` triples forwarded so far.
    pub fn forwarded(&self) -> Vec<(i64, i64, i64)> {
        self.forwarded.lock().unwrap().clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn sync_call_count(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn is_authorized(&self) -> Result<bool, RelayError> {
        Ok(self.authorized.load(Ordering::SeqCst))
    }

    async fn sync_missed_updates(&self) -> Result<(), RelayError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if self.sync_fails.load(Ordering::SeqCst) {
            Err(RelayError::transport_msg("mock sync failure"))
        } else {
            Ok(())
        }
    }

    async fn dialogs(&self) -> Result<Vec<DialogInfo>, RelayError> {
        Ok(self.dialogs.lock().unwrap().clone())
    }

    async fn next_event(&self) -> Result<ChatEvent, RelayError> {
        loop {
            if self.dead.load(Ordering::SeqCst) {
                return Err(RelayError::transport_msg("mock stream closed"));
            }
            if let Some(event) = self.inbound.lock().unwrap().pop_front() {
                return Ok(event);
            }
            self.notify.notified().await;
        }
    }

    async fn forward_message(
        &self,
        source_chat_id: i64,
        message_id: i64,
        target_chat_id: i64,
    ) -> Result<(), RelayError> {
        if self.forward_fails.load(Ordering::SeqCst) {
            return Err(RelayError::transport_msg("mock forward failure"));
        }
        self.forwarded
            .lock()
            .unwrap()
            .push((source_chat_id, message_id, target_chat_id));
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Delegating wrapper so the same scripted gateway can be handed out as a
/// fresh `Box<dyn Gateway>` on every connect.
struct SharedGateway(Arc<MockGateway>);

#[async_trait]
impl Gateway for SharedGateway {
    async fn is_authorized(&self) -> Result<bool, RelayError> {
        self.0.is_authorized().await
    }

    async fn sync_missed_updates(&self) -> Result<(), RelayError> {
        self.0.sync_missed_updates().await
    }

    async fn dialogs(&self) -> Result<Vec<DialogInfo>, RelayError> {
        self.0.dialogs().await
    }

    async fn next_event(&self) -> Result<ChatEvent, RelayError> {
        self.0.next_event().await
    }

    async fn forward_message(
        &self,
        source_chat_id: i64,
        message_id: i64,
        target_chat_id: i64,
    ) -> Result<(), RelayError> {
        self.0
            .forward_message(source_chat_id, message_id, target_chat_id)
            .await
    }

    async fn disconnect(&self) {
        self.0.disconnect().await
    }
}

/// Scripted connector handing out the shared [`MockGateway`].
pub struct MockConnector {
    gateway: Arc<MockGateway>,
    fail_connects_remaining: AtomicUsize,
    connects: AtomicUsize,
    seen_accounts: Mutex<Vec<AccountSettings>>,
}

impl MockConnector {
    pub fn new(gateway: Arc<MockGateway>) -> Self {
        Self {
            gateway,
            fail_connects_remaining: AtomicUsize::new(0),
            connects: AtomicUsize::new(0),
            seen_accounts: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `count` connection attempts with a transport error.
    pub fn fail_next_connects(&self, count: usize) {
        self.fail_connects_remaining.store(count, Ordering::SeqCst);
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn seen_accounts(&self) -> Vec<AccountSettings> {
        self.seen_accounts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GatewayConnector for MockConnector {
    async fn connect(&self, account: &AccountSettings) -> Result<Box<dyn Gateway>, RelayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.seen_accounts.lock().unwrap().push(account.clone());

        let remaining = self.fail_connects_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_connects_remaining
                .store(remaining - 1, Ordering::SeqCst);
            return Err(RelayError::transport_msg("mock connect failure"));
        }

        Ok(Box::new(SharedGateway(self.gateway.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn account() -> AccountSettings {
        AccountSettings {
            api_id: 1,
            api_hash: "hash".into(),
            session_file: PathBuf::from("test.session"),
            target_title: "Target".into(),
        }
    }

    #[tokio::test]
    async fn next_event_returns_injected_events_in_order() {
        let gateway = MockGateway::new();
        gateway.inject_event(ChatEvent {
            chat_id: Some(1),
            kind: None,
            message_id: 1,
            text: "first".into(),
            date: None,
        });
        gateway.inject_event(ChatEvent {
            chat_id: Some(1),
            kind: None,
            message_id: 2,
            text: "second".into(),
            date: None,
        });

        assert_eq!(gateway.next_event().await.unwrap().text, "first");
        assert_eq!(gateway.next_event().await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn killed_stream_errors() {
        let gateway = MockGateway::new();
        gateway.kill_stream();
        assert!(gateway.next_event().await.is_err());
    }

    #[tokio::test]
    async fn connector_scripts_failures_then_succeeds() {
        let gateway = MockGateway::new();
        let connector = MockConnector::new(gateway);
        connector.fail_next_connects(2);

        assert!(connector.connect(&account()).await.is_err());
        assert!(connector.connect(&account()).await.is_err());
        assert!(connector.connect(&account()).await.is_ok());
        assert_eq!(connector.connect_count(), 3);
    }
}
