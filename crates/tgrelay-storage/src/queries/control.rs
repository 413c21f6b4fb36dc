// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control-state reads for the supervisor and writes for the admin seam.

use chrono::{Duration, Utc};
use rusqlite::params;

use tgrelay_core::{ControlState, RelayError};

use crate::database::{Database, format_timestamp, now_string, parse_timestamp};

/// Read the admin control switches. The singleton row is seeded by the
/// initial migration, so a missing row only happens on a foreign database;
/// it reads as the default (disabled, no restart requested).
pub async fn control_state_get(db: &Database) -> Result<ControlState, RelayError> {
    db.connection()
        .call(|conn| {
            use rusqlite::OptionalExtension;
            let row: Option<(bool, Option<String>)> = conn
                .query_row(
                    "SELECT enabled, restart_requested_at FROM control_state WHERE id = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let (enabled, restart_raw) = row.unwrap_or((false, None));
            Ok(ControlState {
                enabled,
                restart_requested_at: restart_raw.as_deref().and_then(parse_timestamp),
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Enable or disable monitoring (admin seam).
pub async fn control_set_enabled(db: &Database, enabled: bool) -> Result<(), RelayError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE control_state SET enabled = ?1, updated_at = ?2 WHERE id = 1",
                params![enabled, now_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Request a soft restart (admin seam).
///
/// `restart_requested_at` must strictly increase so the supervisor sees
/// every request; when the clock has not advanced past the previous value,
/// the new one is bumped a millisecond beyond it.
pub async fn control_request_restart(db: &Database) -> Result<(), RelayError> {
    db.connection()
        .call(|conn| {
            use rusqlite::OptionalExtension;
            let prev: Option<String> = conn
                .query_row(
                    "SELECT restart_requested_at FROM control_state WHERE id = 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();

            let mut requested = Utc::now();
            if let Some(prev) = prev.as_deref().and_then(parse_timestamp)
                && requested <= prev
            {
                requested = prev + Duration::milliseconds(1);
            }

            conn.execute(
                "UPDATE control_state SET restart_requested_at = ?1, updated_at = ?2 WHERE id = 1",
                params![format_timestamp(requested), now_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
