// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only error event log.

use rusqlite::params;

use tgrelay_core::{RelayError, text};

use crate::database::Database;
use crate::models::ErrorEventRow;

const MAX_MESSAGE_CHARS: usize = 4000;

/// Append one error event. Blank messages are recorded as "unknown error"
/// so a failure is never silently dropped.
pub async fn error_add(db: &Database, message: &str) -> Result<(), RelayError> {
    let mut message = text::clip(message.trim(), MAX_MESSAGE_CHARS);
    if message.is_empty() {
        message = "unknown error".to_string();
    }
    db.connection()
        .call(move |conn| {
            conn.execute("INSERT INTO error_log (message) VALUES (?1)", params![message])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Latest error events, newest first (admin seam).
pub async fn error_latest(db: &Database, limit: i64) -> Result<Vec<ErrorEventRow>, RelayError> {
    let limit = limit.clamp(1, 200);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, message, created_at FROM error_log
                 ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(ErrorEventRow {
                    id: row.get(0)?,
                    message: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
