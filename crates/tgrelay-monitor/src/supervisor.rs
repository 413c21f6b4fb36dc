// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection supervisor: owns the account-session client and drives the
//! monitoring state machine.
//!
//! One supervisor runs per process. Each ~1 s tick it polls control state,
//! honors soft-restart and disable signals, and otherwise ensures a live,
//! authorized connection with a resolved relay target and an installed event
//! dispatcher. The client handle and resolved target are exclusively owned
//! here and discarded on every disconnect path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tgrelay_config::model::{MonitorConfig, TelegramConfig};
use tgrelay_core::{
    AccountSettings, ErrorKind, Gateway, GatewayConnector, RelayError, Repository, ResolvedTarget,
};

use crate::dispatcher::EventDispatcher;
use crate::resolver;

/// How long a cooperative disconnect may take before it is abandoned.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Supervisor states, in the order a healthy cycle visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SupervisorState {
    Disabled,
    Connecting,
    Connected,
    BackingOff,
    RestartPending,
    Stopped,
}

/// One live connection: the gateway handle, its update pump, and the flag
/// the pump raises when the stream dies.
struct ActiveConnection {
    gateway: Arc<dyn Gateway>,
    pump: tokio::task::JoinHandle<()>,
    stream_dead: Arc<AtomicBool>,
}

/// Read-only view of the resolved target, exposed to the admin layer.
///
/// `should_monitor_chat` centralizes the "never monitor the relay
/// destination" rule for any future filtering logic.
#[derive(Clone)]
pub struct MonitorHandle {
    target: Arc<ArcSwapOption<ResolvedTarget>>,
}

impl MonitorHandle {
    pub fn resolved_target_id(&self) -> Option<i64> {
        self.target.load_full().map(|t| t.chat_id)
    }

    pub fn is_target_chat(&self, chat_id: i64) -> bool {
        self.resolved_target_id() == Some(chat_id)
    }

    pub fn should_monitor_chat(&self, chat_id: i64) -> bool {
        !self.is_target_chat(chat_id)
    }
}

/// The connection-state supervisor.
pub struct Supervisor {
    repo: Arc<dyn Repository>,
    connector: Arc<dyn GatewayConnector>,
    telegram: TelegramConfig,
    config: MonitorConfig,
    state: SupervisorState,
    target: Arc<ArcSwapOption<ResolvedTarget>>,
    active: Option<ActiveConnection>,
    last_restart_seen: Option<DateTime<Utc>>,
    // Status-write dedup caches, scoped to this instance so multiple
    // monitored accounts would not share suppression state.
    last_reported_connected: Option<bool>,
    last_reported_error: Option<Option<String>>,
    last_reported_target: Option<ResolvedTarget>,
}

impl Supervisor {
    pub fn new(
        repo: Arc<dyn Repository>,
        connector: Arc<dyn GatewayConnector>,
        telegram: TelegramConfig,
        config: MonitorConfig,
    ) -> Self {
        Self {
            repo,
            connector,
            telegram,
            config,
            state: SupervisorState::Disabled,
            target: Arc::new(ArcSwapOption::empty()),
            active: None,
            last_restart_seen: None,
            last_reported_connected: None,
            last_reported_error: None,
            last_reported_target: None,
        }
    }

    /// A cloneable admin-facing view of this supervisor's resolved target.
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            target: self.target.clone(),
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Run until the cancellation token fires.
    ///
    /// Every failure the taxonomy knows about is reported and retried; only
    /// a storage failure (the supervisor cannot even report) propagates, so
    /// the host process can decide on restart policy.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), RelayError> {
        info!("monitor runtime started");
        self.repo
            .status_set_event(Utc::now(), "monitor runtime started")
            .await?;

        let result = self.run_loop(&cancel).await;

        if let Err(e) = &result {
            warn!(error = %e, kind = %e.kind(), "monitor loop failed");
            let _ = self
                .repo
                .error_event_add(&format!("monitor loop failed: {e}"))
                .await;
        }

        self.disconnect_active().await;
        self.state = SupervisorState::Stopped;
        let _ = self.report_connected(false).await;
        let _ = self
            .repo
            .status_set_event(Utc::now(), "monitor runtime stopped")
            .await;
        info!("monitor runtime stopped");

        result
    }

    async fn run_loop(&mut self, cancel: &CancellationToken) -> Result<(), RelayError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let control = self.repo.control_state().await?;

            // Soft restart: drop the connection, never the process.
            if let Some(requested) = control.restart_requested_at
                && self.last_restart_seen != Some(requested)
            {
                self.last_restart_seen = Some(requested);
                self.state = SupervisorState::RestartPending;
                info!("soft restart requested");
                self.repo
                    .status_set_event(Utc::now(), "soft restart requested")
                    .await?;
                self.disconnect_active().await;
                self.report_connected(false).await?;
                if self.sleep_or_cancel(self.poll_interval(), cancel).await {
                    return Ok(());
                }
                continue;
            }

            if !control.enabled {
                if self.state != SupervisorState::Disabled {
                    debug!("monitoring disabled");
                }
                self.state = SupervisorState::Disabled;
                self.disconnect_active().await;
                self.report_connected(false).await?;
                if self.sleep_or_cancel(self.poll_interval(), cancel).await {
                    return Ok(());
                }
                continue;
            }

            let backoff = match self.ensure_connected().await {
                Ok(()) => {
                    self.state = SupervisorState::Connected;
                    self.report_connected(true).await?;
                    self.report_error(None).await?;
                    self.poll_interval()
                }
                Err(e) => {
                    self.state = SupervisorState::BackingOff;
                    warn!(error = %e, kind = %e.kind(), "connection attempt failed");
                    self.report_error(Some(&e.to_string())).await?;
                    self.report_connected(false).await?;
                    match e.kind() {
                        // Connect failures wait longer; configuration and
                        // resolution problems re-poll at the normal rate.
                        ErrorKind::Transport => {
                            Duration::from_secs(self.config.connect_backoff_secs)
                        }
                        _ => self.poll_interval(),
                    }
                }
            };

            if self.sleep_or_cancel(backoff, cancel).await {
                return Ok(());
            }
        }
    }

    /// Ensure a live, authorized, fully set-up connection exists.
    async fn ensure_connected(&mut self) -> Result<(), RelayError> {
        // A dead update pump means the transport dropped us; tear down and
        // reconnect on the next attempt.
        if let Some(active) = &self.active
            && active.stream_dead.load(Ordering::SeqCst)
        {
            self.disconnect_active().await;
            return Err(RelayError::transport_msg(
                "update stream ended; reconnecting",
            ));
        }

        if self.active.is_some() {
            return Ok(());
        }

        self.state = SupervisorState::Connecting;

        // Validation happens before any network call; a missing value is a
        // descriptive, recoverable configuration error.
        let account = validate_account(&self.telegram)?;

        let gateway: Arc<dyn Gateway> = Arc::from(self.connector.connect(&account).await?);

        match self.finish_setup(&gateway, &account).await {
            Ok(()) => Ok(()),
            Err(e) => {
                bounded_disconnect(gateway.as_ref()).await;
                self.target.store(None);
                Err(e)
            }
        }
    }

    /// Post-connect steps: authorization check, best-effort update sync,
    /// target resolution, dispatcher installation.
    async fn finish_setup(
        &mut self,
        gateway: &Arc<dyn Gateway>,
        account: &AccountSettings,
    ) -> Result<(), RelayError> {
        if !gateway.is_authorized().await? {
            return Err(RelayError::transport_msg(format!(
                "session `{}` is not authorized; run the login tool to refresh it",
                account.session_file.display()
            )));
        }

        // Missed-update sync is best effort; a failure here must not block
        // the connection.
        if let Err(e) = gateway.sync_missed_updates().await {
            warn!(error = %e, "missed-update sync failed");
            self.repo
                .error_event_add(&format!("missed-update sync failed: {e}"))
                .await?;
        }

        let dialogs = gateway.dialogs().await?;
        let resolved = resolver::resolve_target(&dialogs, &account.target_title)?;

        self.target.store(Some(Arc::new(resolved.clone())));
        // Report resolution only when it changed since the prior cycle, so
        // reconnects do not flood the event stream.
        if self.last_reported_target.as_ref() != Some(&resolved) {
            info!(chat_id = resolved.chat_id, title = %resolved.title, "target resolved");
            self.repo
                .status_set_event(
                    Utc::now(),
                    &format!(
                        "resolved target `{}` to chat {}",
                        resolved.title, resolved.chat_id
                    ),
                )
                .await?;
            self.last_reported_target = Some(resolved);
        }

        self.install_dispatcher(gateway.clone());
        Ok(())
    }

    /// Install the event dispatcher for this client lifecycle.
    ///
    /// `active` doubles as the once-per-connection guard: it is set here and
    /// cleared on every disconnect path, so a reused connection never gets a
    /// second pump.
    fn install_dispatcher(&mut self, gateway: Arc<dyn Gateway>) {
        let stream_dead = Arc::new(AtomicBool::new(false));
        let dispatcher = EventDispatcher::new(
            self.repo.clone(),
            self.target.clone(),
            Duration::from_secs(self.config.retry_after_secs),
            self.config.preview_max_chars,
        );

        let pump_gateway = gateway.clone();
        let pump_dead = stream_dead.clone();
        let pump_repo = self.repo.clone();
        let pump = tokio::spawn(async move {
            loop {
                match pump_gateway.next_event().await {
                    Ok(event) => {
                        dispatcher.handle_event(pump_gateway.as_ref(), event).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "update stream ended");
                        let _ = pump_repo
                            .error_event_add(&format!("update stream ended: {e}"))
                            .await;
                        pump_dead.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }
        });

        self.active = Some(ActiveConnection {
            gateway,
            pump,
            stream_dead,
        });
    }

    /// Drop the live connection, if any: stop the pump, disconnect with a
    /// bounded wait, and discard the client handle and resolved target.
    async fn disconnect_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.pump.abort();
            bounded_disconnect(active.gateway.as_ref()).await;
            self.target.store(None);
            debug!("connection discarded");
        }
    }

    async fn report_connected(&mut self, connected: bool) -> Result<(), RelayError> {
        if self.last_reported_connected != Some(connected) {
            self.repo.status_set_connected(connected).await?;
            self.last_reported_connected = Some(connected);
        }
        Ok(())
    }

    async fn report_error(&mut self, error: Option<&str>) -> Result<(), RelayError> {
        let value = error.map(str::to_string);
        if self.last_reported_error.as_ref() != Some(&value) {
            self.repo.status_set_error(error).await?;
            self.last_reported_error = Some(value);
        }
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_secs)
    }

    /// Sleep for `duration` unless cancelled first. Returns `true` when the
    /// loop should exit.
    async fn sleep_or_cancel(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = cancel.cancelled() => true,
        }
    }
}

/// Disconnect with a bounded wait, swallowing a timeout. Correctness is
/// re-established by the next connect attempt, never by raising here.
async fn bounded_disconnect(gateway: &dyn Gateway) {
    if tokio::time::timeout(DISCONNECT_TIMEOUT, gateway.disconnect())
        .await
        .is_err()
    {
        warn!("disconnect timed out");
    }
}

/// Turn the optional config fields into validated account settings,
/// reporting the first missing one by name. Also used by `tgrelay doctor`.
pub fn validate_account(config: &TelegramConfig) -> Result<AccountSettings, RelayError> {
    let api_id = config
        .api_id
        .ok_or_else(|| RelayError::Config("telegram.api_id is not set".into()))?;

    let api_hash = config
        .api_hash
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| RelayError::Config("telegram.api_hash is not set".into()))?
        .to_string();

    let session_file = config
        .session_file
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| RelayError::Config("telegram.session_file is not set".into()))?;
    let session_file = std::path::PathBuf::from(session_file);
    if !session_file.exists() {
        return Err(RelayError::Config(format!(
            "session file `{}` does not exist; run the login tool first",
            session_file.display()
        )));
    }

    let target_title = config
        .target_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RelayError::Config("telegram.target_title is not set".into()))?
        .to_string();

    Ok(AccountSettings {
        api_id,
        api_hash,
        session_file,
        target_title,
    })
}
