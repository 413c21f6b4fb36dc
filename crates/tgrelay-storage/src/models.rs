// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical monitor types live in `tgrelay-core::types` and are
//! re-exported here for convenience. Row types that only the admin seam
//! reads (keywords, error log listings) are defined locally.

pub use tgrelay_core::types::{
    Checkpoint, CleanupReport, ConnectionStatus, ControlState, ForwardStatus,
};

/// One stored keyword, as listed by the admin seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRow {
    pub id: i64,
    pub keyword: String,
    pub created_at: String,
}

/// One error-log entry, newest first in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEventRow {
    pub id: i64,
    pub message: String,
    pub created_at: String,
}
