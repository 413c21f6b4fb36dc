// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the supervisor state machine against scripted
//! mocks: enable/disable, soft restart, configuration and transport
//! failures, resolution, and the live relay path through the update pump.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use tgrelay_config::model::{MonitorConfig, TelegramConfig};
use tgrelay_core::{ChatEvent, ChatKind, DialogInfo};
use tgrelay_monitor::{MonitorHandle, Supervisor};
use tgrelay_test_utils::{MemoryRepository, MockConnector, MockGateway};

struct Fixture {
    repo: Arc<MemoryRepository>,
    gateway: Arc<MockGateway>,
    connector: Arc<MockConnector>,
    handle: MonitorHandle,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<Result<(), tgrelay_core::RelayError>>,
    _dir: tempfile::TempDir,
}

fn dialog(chat_id: i64, title: &str) -> DialogInfo {
    DialogInfo {
        chat_id,
        title: title.to_string(),
        kind: ChatKind::Channel,
    }
}

fn group_message(chat_id: i64, message_id: i64, text: &str) -> ChatEvent {
    ChatEvent {
        chat_id: Some(chat_id),
        kind: Some(ChatKind::Group),
        message_id,
        text: text.to_string(),
        date: Some(Utc::now()),
    }
}

/// Spawn a supervisor over fresh mocks. The default gateway knows one
/// channel titled "Relay Target" with chat id 900.
fn start(configure: impl FnOnce(&MemoryRepository, &MockGateway, &MockConnector)) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("acc.session");
    std::fs::write(&session, b"").unwrap();

    let repo = Arc::new(MemoryRepository::new());
    let gateway = MockGateway::new();
    gateway.set_dialogs(vec![dialog(900, "Relay Target"), dialog(10, "Source")]);
    let connector = Arc::new(MockConnector::new(gateway.clone()));

    configure(&repo, &gateway, &connector);

    let telegram = TelegramConfig {
        api_id: Some(12345),
        api_hash: Some("hash".into()),
        session_file: Some(session.to_string_lossy().into_owned()),
        target_title: Some("relay target".into()),
    };

    let mut supervisor = Supervisor::new(
        repo.clone(),
        connector.clone(),
        telegram,
        MonitorConfig::default(),
    );
    let handle = supervisor.handle();

    let cancel = CancellationToken::new();
    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { supervisor.run(cancel).await })
    };

    Fixture {
        repo,
        gateway,
        connector,
        handle,
        cancel,
        task,
        _dir: dir,
    }
}

/// Poll `condition` while virtual time auto-advances.
async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached");
}

async fn stop(fixture: Fixture) -> Result<(), tgrelay_core::RelayError> {
    fixture.cancel.cancel();
    fixture.task.await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn disabled_supervisor_never_connects() {
    let fixture = start(|_, _, _| {});

    // Let a handful of ticks pass.
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(fixture.connector.connect_count(), 0);
    assert!(!fixture.repo.snapshot_status().connected);
    // The disconnected flag is written once, then deduplicated.
    assert_eq!(fixture.repo.connected_write_count(), 1);

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn enabled_supervisor_connects_and_resolves_target() {
    let fixture = start(|repo, _, _| repo.set_enabled(true));

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    assert_eq!(fixture.connector.connect_count(), 1);
    assert_eq!(fixture.handle.resolved_target_id(), Some(900));
    assert!(fixture.handle.is_target_chat(900));
    assert!(!fixture.handle.should_monitor_chat(900));
    assert!(fixture.handle.should_monitor_chat(10));
    assert!(
        fixture
            .repo
            .events()
            .iter()
            .any(|e| e.contains("resolved target `Relay Target` to chat 900"))
    );

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn steady_state_deduplicates_status_writes() {
    let fixture = start(|repo, _, _| repo.set_enabled(true));

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    // Many more ticks in the connected state.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fixture.repo.connected_write_count(), 1);

    let repo = fixture.repo.clone();
    stop(fixture).await.unwrap();

    // Shutdown writes the final disconnected state exactly once.
    assert_eq!(repo.connected_write_count(), 2);
    assert!(repo.events().iter().any(|e| e == "monitor runtime stopped"));
}

#[tokio::test(start_paused = true)]
async fn missing_credentials_report_without_network_calls() {
    let repo = Arc::new(MemoryRepository::new());
    repo.set_enabled(true);
    let gateway = MockGateway::new();
    let connector = Arc::new(MockConnector::new(gateway));

    let mut supervisor = Supervisor::new(
        repo.clone(),
        connector.clone(),
        TelegramConfig::default(),
        MonitorConfig::default(),
    );
    let cancel = CancellationToken::new();
    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { supervisor.run(cancel).await })
    };

    let probe = repo.clone();
    wait_until(move || probe.snapshot_status().last_error.is_some()).await;

    let status = repo.snapshot_status();
    assert!(status.last_error.unwrap().contains("api_id"));
    assert!(!status.connected);
    assert_eq!(connector.connect_count(), 0, "no network call on config error");

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn connect_failures_back_off_then_recover() {
    let fixture = start(|repo, _, connector| {
        repo.set_enabled(true);
        connector.fail_next_connects(2);
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    assert_eq!(fixture.connector.connect_count(), 3);
    // The error recorded during backoff is cleared on success.
    assert!(fixture.repo.snapshot_status().last_error.is_none());

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn soft_restart_drops_and_reestablishes_the_connection() {
    let fixture = start(|repo, _, _| repo.set_enabled(true));

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;
    assert_eq!(fixture.connector.connect_count(), 1);

    fixture.repo.request_restart(Utc::now());

    let gateway = fixture.gateway.clone();
    wait_until(move || gateway.disconnect_count() >= 1).await;
    assert!(
        fixture
            .repo
            .events()
            .iter()
            .any(|e| e == "soft restart requested")
    );

    // The supervisor reconnects on the following ticks.
    let connector = fixture.connector.clone();
    wait_until(move || connector.connect_count() >= 2).await;
    let handle = fixture.handle.clone();
    wait_until(move || handle.resolved_target_id() == Some(900)).await;

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn restart_is_observed_exactly_once_per_request() {
    let fixture = start(|repo, _, _| {
        repo.set_enabled(true);
        repo.request_restart(Utc::now());
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    // One restart signal, one restart event, even after many ticks.
    tokio::time::sleep(Duration::from_secs(10)).await;
    let restarts = fixture
        .repo
        .events()
        .iter()
        .filter(|e| *e == "soft restart requested")
        .count();
    assert_eq!(restarts, 1);

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unauthorized_session_discards_the_handle() {
    let fixture = start(|repo, gateway, _| {
        repo.set_enabled(true);
        gateway.set_authorized(false);
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().last_error.is_some()).await;

    assert!(
        fixture
            .repo
            .snapshot_status()
            .last_error
            .unwrap()
            .contains("not authorized")
    );
    assert!(fixture.gateway.disconnect_count() >= 1);
    assert!(fixture.handle.resolved_target_id().is_none());

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn ambiguous_target_title_fails_resolution() {
    let fixture = start(|repo, gateway, _| {
        repo.set_enabled(true);
        gateway.set_dialogs(vec![dialog(1, "Relay Target"), dialog(2, "RELAY TARGET")]);
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().last_error.is_some()).await;

    let error = fixture.repo.snapshot_status().last_error.unwrap();
    assert!(error.contains("ambiguous"));
    assert!(fixture.handle.resolved_target_id().is_none());
    assert!(!fixture.repo.snapshot_status().connected);

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn missing_target_title_fails_resolution() {
    let fixture = start(|repo, gateway, _| {
        repo.set_enabled(true);
        gateway.set_dialogs(vec![dialog(1, "Something Else")]);
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().last_error.is_some()).await;

    assert!(
        fixture
            .repo
            .snapshot_status()
            .last_error
            .unwrap()
            .contains("not found")
    );

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sync_failure_is_nonfatal() {
    let fixture = start(|repo, gateway, _| {
        repo.set_enabled(true);
        gateway.set_sync_fails(true);
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    assert!(fixture.gateway.sync_call_count() >= 1);
    assert!(
        fixture
            .repo
            .error_events()
            .iter()
            .any(|e| e.contains("missed-update sync failed"))
    );

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn dead_update_stream_triggers_a_reconnect() {
    let fixture = start(|repo, _, _| repo.set_enabled(true));

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    fixture.gateway.kill_stream();

    let connector = fixture.connector.clone();
    wait_until(move || connector.connect_count() >= 2).await;
    assert!(
        fixture
            .repo
            .error_events()
            .iter()
            .any(|e| e.contains("update stream ended"))
    );

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn resolution_event_is_not_repeated_across_reconnects() {
    let fixture = start(|repo, _, _| repo.set_enabled(true));

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    // Force a reconnect with the same dialogs.
    fixture.gateway.kill_stream();
    let connector = fixture.connector.clone();
    wait_until(move || connector.connect_count() >= 2).await;
    let handle = fixture.handle.clone();
    wait_until(move || handle.resolved_target_id() == Some(900)).await;

    let resolutions = fixture
        .repo
        .events()
        .iter()
        .filter(|e| e.contains("resolved target"))
        .count();
    assert_eq!(resolutions, 1);

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn matching_message_is_relayed_through_the_live_pump() {
    let fixture = start(|repo, _, _| {
        repo.set_enabled(true);
        repo.set_keywords(&["новости"]);
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    fixture
        .gateway
        .inject_event(group_message(10, 100, "Срочные новости дня"));

    let gateway = fixture.gateway.clone();
    wait_until(move || !gateway.forwarded().is_empty()).await;
    assert_eq!(fixture.gateway.forwarded(), vec![(10, 100, 900)]);

    // Re-delivery never forwards twice.
    fixture
        .gateway
        .inject_event(group_message(10, 100, "Срочные новости дня"));
    fixture
        .gateway
        .inject_event(group_message(10, 101, "без ключевых слов"));

    let repo = fixture.repo.clone();
    wait_until(move || {
        repo.snapshot_status()
            .last_event_message
            .is_some_and(|m| m.contains("message 101"))
    })
    .await;
    assert_eq!(fixture.gateway.forwarded().len(), 1);

    stop(fixture).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn events_from_the_target_chat_are_ignored_by_the_pump() {
    let fixture = start(|repo, _, _| {
        repo.set_enabled(true);
        repo.set_keywords(&["новости"]);
    });

    let repo = fixture.repo.clone();
    wait_until(move || repo.snapshot_status().connected).await;

    // A matching message in the relay destination itself.
    fixture
        .gateway
        .inject_event(group_message(900, 1, "новости из целевого канала"));
    // A later marker message so we know the first was processed.
    fixture
        .gateway
        .inject_event(group_message(10, 2, "маркер"));

    let repo = fixture.repo.clone();
    wait_until(move || {
        repo.snapshot_status()
            .last_event_message
            .is_some_and(|m| m.contains("message 2"))
    })
    .await;

    assert!(fixture.gateway.forwarded().is_empty());

    stop(fixture).await.unwrap();
}
