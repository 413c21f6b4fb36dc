// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tgrelay serve` command implementation.
//!
//! Wires the SQLite repository, the grammers gateway connector, the
//! connection supervisor, and the retention cleaner, then runs until
//! SIGINT/SIGTERM.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tgrelay_config::model::TgrelayConfig;
use tgrelay_core::{RelayError, Repository};
use tgrelay_monitor::{RetentionCleaner, Supervisor};
use tgrelay_storage::SqliteRepository;
use tgrelay_telegram::TelegramConnector;

/// Run the `tgrelay serve` command.
pub async fn run_serve(config: TgrelayConfig) -> Result<(), RelayError> {
    init_tracing(&config.runtime.log_level);
    info!("starting tgrelay serve");

    let repo = Arc::new(SqliteRepository::new(config.storage.clone()));
    repo.initialize().await?;
    let repo_dyn: Arc<dyn Repository> = repo.clone();

    let cancel = install_signal_handler();

    // Retention cleaner runs independently of the supervisor; they only
    // meet at the repository.
    let cleaner = RetentionCleaner::new(repo_dyn.clone(), config.retention.clone());
    let cleaner_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { cleaner.run(cancel).await })
    };

    let connector = Arc::new(TelegramConnector::new());
    let mut supervisor = Supervisor::new(
        repo_dyn,
        connector,
        config.telegram.clone(),
        config.monitor.clone(),
    );

    let result = supervisor.run(cancel.clone()).await;

    // Make sure the cleaner winds down even when the supervisor failed.
    cancel.cancel();
    let _ = cleaner_task.await;

    repo.close().await?;
    info!("tgrelay serve shutdown complete");
    result
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tgrelay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
