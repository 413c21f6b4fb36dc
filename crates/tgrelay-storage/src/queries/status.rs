// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection-status writes (supervisor/dispatcher) and reads (admin seam).

use chrono::{DateTime, Utc};
use rusqlite::params;

use tgrelay_core::{ConnectionStatus, RelayError, text};

use crate::database::{Database, format_timestamp, now_string, parse_timestamp};

/// Longest error/event text persisted; longer strings are clipped.
const MAX_TEXT_CHARS: usize = 4000;

pub async fn status_set_connected(db: &Database, connected: bool) -> Result<(), RelayError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE connection_status SET connected = ?1, updated_at = ?2 WHERE id = 1",
                params![connected, now_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Set or clear the last connection error.
pub async fn status_set_error(db: &Database, error: Option<&str>) -> Result<(), RelayError> {
    let error = error
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|e| text::clip(e, MAX_TEXT_CHARS));
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE connection_status SET last_error = ?1, updated_at = ?2 WHERE id = 1",
                params![error, now_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record the latest noteworthy event.
pub async fn status_set_event(
    db: &Database,
    when: DateTime<Utc>,
    message: &str,
) -> Result<(), RelayError> {
    let message = text::clip(message.trim(), MAX_TEXT_CHARS);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE connection_status
                 SET last_event_time = ?1, last_event_message = ?2, updated_at = ?3
                 WHERE id = 1",
                params![format_timestamp(when), message, now_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Read the full status row.
pub async fn status_get(db: &Database) -> Result<ConnectionStatus, RelayError> {
    db.connection()
        .call(|conn| {
            use rusqlite::OptionalExtension;
            let row: Option<(bool, Option<String>, Option<String>, Option<String>)> = conn
                .query_row(
                    "SELECT connected, last_error, last_event_time, last_event_message
                     FROM connection_status WHERE id = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;
            let (connected, last_error, event_time_raw, last_event_message) =
                row.unwrap_or((false, None, None, None));
            Ok(ConnectionStatus {
                connected,
                last_error,
                last_event_time: event_time_raw.as_deref().and_then(parse_timestamp),
                last_event_message,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn connected_flag_round_trips() {
        let (db, _dir) = setup_db().await;
        assert!(!status_get(&db).await.unwrap().connected);

        status_set_connected(&db, true).await.unwrap();
        assert!(status_get(&db).await.unwrap().connected);

        status_set_connected(&db, false).await.unwrap();
        assert!(!status_get(&db).await.unwrap().connected);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn error_set_and_cleared() {
        let (db, _dir) = setup_db().await;
        status_set_error(&db, Some("connect refused")).await.unwrap();
        assert_eq!(
            status_get(&db).await.unwrap().last_error.as_deref(),
            Some("connect refused")
        );

        status_set_error(&db, None).await.unwrap();
        assert!(status_get(&db).await.unwrap().last_error.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn blank_error_is_stored_as_cleared() {
        let (db, _dir) = setup_db().await;
        status_set_error(&db, Some("   ")).await.unwrap();
        assert!(status_get(&db).await.unwrap().last_error.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_error_is_clipped() {
        let (db, _dir) = setup_db().await;
        let long = "e".repeat(6000);
        status_set_error(&db, Some(&long)).await.unwrap();
        let stored = status_get(&db).await.unwrap().last_error.unwrap();
        assert_eq!(stored.chars().count(), 4000);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn event_records_time_and_message() {
        let (db, _dir) = setup_db().await;
        let when = Utc::now();
        status_set_event(&db, when, "msg 100 in chat 10: preview")
            .await
            .unwrap();

        let status = status_get(&db).await.unwrap();
        assert_eq!(
            status.last_event_message.as_deref(),
            Some("msg 100 in chat 10: preview")
        );
        assert_eq!(
            status.last_event_time.unwrap().timestamp_millis(),
            when.timestamp_millis()
        );
        db.close().await.unwrap();
    }
}
