// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent forwarding ledger: claim/commit protocol guaranteeing each
//! source message is forwarded at most once.
//!
//! The claim runs in a single transaction on the keyed row:
//! - no row yet: insert as `pending`, claim granted
//! - `sent`: terminal, never granted again
//! - `pending`/`failed` older than the retry window: re-claimed (tolerates a
//!   claimant crashing mid-work)
//! - otherwise: an unexpired claim owns the work, not granted

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::params;

use tgrelay_core::{RelayError, text};

use crate::database::{Database, format_timestamp, parse_timestamp};

const MAX_ERROR_CHARS: usize = 4000;

/// Attempt to claim `(chat_id, message_id)` for processing.
///
/// Returns `true` only when the caller is cleared to process and must then
/// call [`mark_sent`] or [`mark_failed`].
pub async fn claim(
    db: &Database,
    chat_id: i64,
    message_id: i64,
    retry_after: Duration,
) -> Result<bool, RelayError> {
    db.connection()
        .call(move |conn| Ok(claim_tx(conn, chat_id, message_id, retry_after, Utc::now())?))
        .await
        .map_err(crate::database::map_tr_err)
}

/// The claim transaction, with an injectable clock for tests.
pub(crate) fn claim_tx(
    conn: &mut rusqlite::Connection,
    chat_id: i64,
    message_id: i64,
    retry_after: Duration,
    now: DateTime<Utc>,
) -> Result<bool, rusqlite::Error> {
    use rusqlite::OptionalExtension;

    let retry_after = chrono::Duration::seconds(retry_after.as_secs().max(1) as i64);
    let now_s = format_timestamp(now);

    let tx = conn.transaction()?;

    let row: Option<(String, Option<String>)> = tx
        .query_row(
            "SELECT status, claimed_at FROM forward_ledger
             WHERE source_chat_id = ?1 AND source_message_id = ?2",
            params![chat_id, message_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let granted = match row {
        None => {
            tx.execute(
                "INSERT INTO forward_ledger
                     (source_chat_id, source_message_id, status, claimed_at,
                      created_at, updated_at)
                 VALUES (?1, ?2, 'pending', ?3, ?3, ?3)",
                params![chat_id, message_id, now_s],
            )?;
            true
        }
        Some((status, _)) if status == "sent" => false,
        Some((_, claimed_at)) => {
            // Re-claimable when the previous claim is absent or expired.
            let expired = match claimed_at.as_deref().and_then(parse_timestamp) {
                Some(claimed) => now.signed_duration_since(claimed) >= retry_after,
                None => true,
            };
            if expired {
                tx.execute(
                    "UPDATE forward_ledger
                     SET status = 'pending', claimed_at = ?3, updated_at = ?3
                     WHERE source_chat_id = ?1 AND source_message_id = ?2",
                    params![chat_id, message_id, now_s],
                )?;
            }
            expired
        }
    };

    tx.commit()?;
    Ok(granted)
}

/// Mark the claim as sent. Terminal.
pub async fn mark_sent(db: &Database, chat_id: i64, message_id: i64) -> Result<(), RelayError> {
    db.connection()
        .call(move |conn| {
            let now_s = format_timestamp(Utc::now());
            conn.execute(
                "UPDATE forward_ledger
                 SET status = 'sent', sent_at = ?3, updated_at = ?3
                 WHERE source_chat_id = ?1 AND source_message_id = ?2",
                params![chat_id, message_id, now_s],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark the claim as failed, incrementing the failure counter and storing a
/// clipped error. The row becomes re-claimable after the retry window.
pub async fn mark_failed(
    db: &Database,
    chat_id: i64,
    message_id: i64,
    error: &str,
) -> Result<(), RelayError> {
    let error = text::clip(error.trim(), MAX_ERROR_CHARS);
    db.connection()
        .call(move |conn| {
            let now_s = format_timestamp(Utc::now());
            conn.execute(
                "UPDATE forward_ledger
                 SET status = 'failed', fail_count = fail_count + 1,
                     last_error = ?3, updated_at = ?4
                 WHERE source_chat_id = ?1 AND source_message_id = ?2",
                params![chat_id, message_id, error, now_s],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
