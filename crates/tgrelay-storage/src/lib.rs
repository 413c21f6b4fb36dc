// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the tgrelay monitor.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for control
//! state, connection status, the idempotent forward ledger, channel
//! checkpoints, the error log, and the keyword set.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod repository;

pub use database::Database;
pub use models::*;
pub use repository::SqliteRepository;
