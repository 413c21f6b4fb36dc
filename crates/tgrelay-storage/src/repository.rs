// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the core `Repository` trait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use tgrelay_config::model::StorageConfig;
use tgrelay_core::{
    Checkpoint, CleanupReport, ConnectionStatus, ControlState, RelayError, Repository,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed repository.
///
/// Wraps a [`Database`] handle and delegates all operations to the typed
/// query modules. The database is lazily opened on the first call to
/// [`initialize`](Self::initialize).
pub struct SqliteRepository {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteRepository {
    /// Create a new repository with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize)
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database at the configured path and run migrations.
    pub async fn initialize(&self) -> Result<(), RelayError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| RelayError::Internal(
            "repository already initialized".into(),
        ))?;
        debug!(path = %self.config.database_path, "SQLite repository initialized");
        Ok(())
    }

    /// Checkpoint the WAL, flushing pending writes. Safe to call through a
    /// shared handle at shutdown.
    pub async fn close(&self) -> Result<(), RelayError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    /// Access to the underlying database, for the admin-seam query helpers.
    pub fn db(&self) -> Result<&Database, RelayError> {
        self.db.get().ok_or_else(|| {
            RelayError::Internal("repository not initialized -- call initialize() first".into())
        })
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn control_state(&self) -> Result<ControlState, RelayError> {
        queries::control::control_state_get(self.db()?).await
    }

    async fn status_set_connected(&self, connected: bool) -> Result<(), RelayError> {
        queries::status::status_set_connected(self.db()?, connected).await
    }

    async fn status_set_error(&self, error: Option<&str>) -> Result<(), RelayError> {
        queries::status::status_set_error(self.db()?, error).await
    }

    async fn status_set_event(
        &self,
        when: DateTime<Utc>,
        message: &str,
    ) -> Result<(), RelayError> {
        queries::status::status_set_event(self.db()?, when, message).await
    }

    async fn status(&self) -> Result<ConnectionStatus, RelayError> {
        queries::status::status_get(self.db()?).await
    }

    async fn ledger_claim(
        &self,
        chat_id: i64,
        message_id: i64,
        retry_after: Duration,
    ) -> Result<bool, RelayError> {
        queries::ledger::claim(self.db()?, chat_id, message_id, retry_after).await
    }

    async fn ledger_mark_sent(&self, chat_id: i64, message_id: i64) -> Result<(), RelayError> {
        queries::ledger::mark_sent(self.db()?, chat_id, message_id).await
    }

    async fn ledger_mark_failed(
        &self,
        chat_id: i64,
        message_id: i64,
        error: &str,
    ) -> Result<(), RelayError> {
        queries::ledger::mark_failed(self.db()?, chat_id, message_id, error).await
    }

    async fn checkpoint_get(&self, chat_id: i64) -> Result<Option<Checkpoint>, RelayError> {
        queries::checkpoint::checkpoint_get(self.db()?, chat_id).await
    }

    async fn checkpoint_upsert(
        &self,
        chat_id: i64,
        message_id: i64,
        date: Option<DateTime<Utc>>,
    ) -> Result<(), RelayError> {
        queries::checkpoint::checkpoint_upsert(self.db()?, chat_id, message_id, date).await
    }

    async fn error_event_add(&self, message: &str) -> Result<(), RelayError> {
        queries::events::error_add(self.db()?, message).await
    }

    async fn keywords_normalized(&self) -> Result<Vec<String>, RelayError> {
        queries::keywords::keywords_all_normalized(self.db()?).await
    }

    async fn cleanup(
        &self,
        error_retention_days: u32,
        ledger_retention_days: u32,
    ) -> Result<CleanupReport, RelayError> {
        queries::retention::cleanup(self.db()?, error_retention_days, ledger_retention_days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    async fn setup() -> (SqliteRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("repo.db");
        let repo = SqliteRepository::new(make_config(db_path.to_str().unwrap()));
        repo.initialize().await.unwrap();
        (repo, dir)
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let repo = SqliteRepository::new(make_config(db_path.to_str().unwrap()));
        assert!(repo.control_state().await.is_err());
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let (repo, _dir) = setup().await;
        assert!(repo.initialize().await.is_err());
    }

    #[tokio::test]
    async fn trait_round_trip_through_all_operations() {
        let (repo, _dir) = setup().await;
        let repo: &dyn Repository = &repo;

        let state = repo.control_state().await.unwrap();
        assert!(!state.enabled);

        repo.status_set_connected(true).await.unwrap();
        repo.status_set_error(Some("boom")).await.unwrap();
        repo.status_set_event(Utc::now(), "resolved target").await.unwrap();
        let status = repo.status().await.unwrap();
        assert!(status.connected);
        assert_eq!(status.last_error.as_deref(), Some("boom"));
        assert_eq!(status.last_event_message.as_deref(), Some("resolved target"));

        assert!(repo.ledger_claim(1, 2, Duration::from_secs(60)).await.unwrap());
        repo.ledger_mark_sent(1, 2).await.unwrap();
        assert!(!repo.ledger_claim(1, 2, Duration::from_secs(60)).await.unwrap());

        repo.checkpoint_upsert(1, 2, None).await.unwrap();
        assert_eq!(repo.checkpoint_get(1).await.unwrap().unwrap().last_message_id, 2);

        repo.error_event_add("handler failed").await.unwrap();
        assert!(repo.keywords_normalized().await.unwrap().is_empty());

        let report = repo.cleanup(7, 30).await.unwrap();
        assert_eq!(report.error_events_deleted, 0);
        assert_eq!(report.ledger_rows_deleted, 0);
    }
}
