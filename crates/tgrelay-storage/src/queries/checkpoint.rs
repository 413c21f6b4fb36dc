// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel checkpoints: the last processed message marker used to close
//! gaps after a disconnect. Not a concurrency primitive; the single
//! supervisor is the only writer per chat.

use chrono::{DateTime, Utc};
use rusqlite::params;

use tgrelay_core::{Checkpoint, RelayError};

use crate::database::{Database, format_timestamp, now_string, parse_timestamp};

pub async fn checkpoint_get(db: &Database, chat_id: i64) -> Result<Option<Checkpoint>, RelayError> {
    db.connection()
        .call(move |conn| {
            use rusqlite::OptionalExtension;
            let row: Option<(i64, Option<String>)> = conn
                .query_row(
                    "SELECT last_message_id, last_message_date FROM channel_checkpoint
                     WHERE chat_id = ?1",
                    params![chat_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(row.map(|(last_message_id, date_raw)| Checkpoint {
                last_message_id,
                last_message_date: date_raw.as_deref().and_then(parse_timestamp),
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert-or-update the checkpoint for `chat_id`.
pub async fn checkpoint_upsert(
    db: &Database,
    chat_id: i64,
    last_message_id: i64,
    last_message_date: Option<DateTime<Utc>>,
) -> Result<(), RelayError> {
    let date_s = last_message_date.map(format_timestamp);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO channel_checkpoint
                     (chat_id, last_message_id, last_message_date, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (chat_id) DO UPDATE
                     SET last_message_id = excluded.last_message_id,
                         last_message_date = excluded.last_message_date,
                         updated_at = excluded.updated_at",
                params![chat_id, last_message_id, date_s, now_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
