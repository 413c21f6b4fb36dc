// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention cleaner: a daily job pruning old error events and ledger rows.
//!
//! Runs at a fixed UTC wall-clock hour (next occurrence today or tomorrow).
//! A failed run is reported and the loop reschedules unconditionally; one
//! bad cycle never cancels future ones. No in-memory state is shared with
//! the supervisor; contention happens only at the repository.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tgrelay_config::model::RetentionConfig;
use tgrelay_core::{CleanupReport, RelayError, Repository};

pub struct RetentionCleaner {
    repo: Arc<dyn Repository>,
    config: RetentionConfig,
}

impl RetentionCleaner {
    pub fn new(repo: Arc<dyn Repository>, config: RetentionConfig) -> Self {
        Self { repo, config }
    }

    /// The next occurrence of `hour:00:00Z` strictly after `now`.
    pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
        let Some(at_hour) = now.date_naive().and_hms_opt(hour.min(23), 0, 0) else {
            return now + ChronoDuration::days(1);
        };
        let today = at_hour.and_utc();
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }

    /// One cleanup pass: delete per the configured windows and record the
    /// row counts as a status event.
    pub async fn run_once(&self) -> Result<CleanupReport, RelayError> {
        let report = self
            .repo
            .cleanup(self.config.error_log_days, self.config.ledger_days)
            .await?;
        info!(
            error_events = report.error_events_deleted,
            ledger_rows = report.ledger_rows_deleted,
            "retention cleanup complete"
        );
        self.repo
            .status_set_event(
                Utc::now(),
                &format!(
                    "retention cleanup removed {} error events and {} ledger rows",
                    report.error_events_deleted, report.ledger_rows_deleted
                ),
            )
            .await?;
        Ok(report)
    }

    /// Run daily until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            let now = Utc::now();
            let next = Self::next_run_after(now, self.config.cleanup_hour_utc);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(at = %next, "next retention cleanup scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "retention cleanup failed");
                        let _ = self
                            .repo
                            .error_event_add(&format!("retention cleanup failed: {e}"))
                            .await;
                    }
                }
                _ = cancel.cancelled() => {
                    info!("retention cleaner stopped");
                    return;
                }
            }
        }
    }
}
