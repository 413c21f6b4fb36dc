// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread; the [`Database`] struct IS the single writer. Query modules accept
//! `&Database` and call through `connection().call()`. Do NOT create
//! additional connections for writes.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use tgrelay_core::RelayError;

use crate::migrations;

/// Handle to the single SQLite connection, shared by all query modules.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if necessary) the database at `path`, apply PRAGMAs,
    /// and run all pending migrations.
    pub async fn open(path: &str) -> Result<Self, RelayError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| RelayError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_tr_err)?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// The underlying serialized connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), RelayError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the storage error kind.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> RelayError {
    RelayError::Storage {
        source: Box::new(e),
    }
}

/// Current time in the canonical column format (UTC RFC 3339, millis).
pub(crate) fn now_string() -> String {
    format_timestamp(Utc::now())
}

/// Format a timestamp in the canonical column format.
pub(crate) fn format_timestamp(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a column timestamp. Returns `None` for malformed text rather than
/// failing the whole row.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
