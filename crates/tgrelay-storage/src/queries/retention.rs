// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention deletes for the error log and forward ledger, by creation
//! timestamp. Both deletes commit in one transaction.

use chrono::{Duration, Utc};
use rusqlite::params;

use tgrelay_core::{CleanupReport, RelayError};

use crate::database::{Database, format_timestamp};

/// Delete error events older than `error_retention_days` and ledger rows
/// older than `ledger_retention_days`. Day counts below 1 are raised to 1.
pub async fn cleanup(
    db: &Database,
    error_retention_days: u32,
    ledger_retention_days: u32,
) -> Result<CleanupReport, RelayError> {
    let now = Utc::now();
    let error_cutoff = format_timestamp(now - Duration::days(error_retention_days.max(1) as i64));
    let ledger_cutoff = format_timestamp(now - Duration::days(ledger_retention_days.max(1) as i64));

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let error_events_deleted = tx.execute(
                "DELETE FROM error_log WHERE created_at < ?1",
                params![error_cutoff],
            )? as u64;
            let ledger_rows_deleted = tx.execute(
                "DELETE FROM forward_ledger WHERE created_at < ?1",
                params![ledger_cutoff],
            )? as u64;
            tx.commit()?;
            Ok(CleanupReport {
                error_events_deleted,
                ledger_rows_deleted,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}
