// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the tgrelay channel monitor.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the tgrelay workspace. The storage backend
//! implements [`Repository`]; the Telegram client implements [`Gateway`] and
//! [`GatewayConnector`].

pub mod error;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ErrorKind, RelayError, ResolutionError};
pub use traits::{Gateway, GatewayConnector, Repository};
pub use types::{
    AccountSettings, ChatEvent, ChatKind, Checkpoint, CleanupReport, ConnectionStatus,
    ControlState, DialogInfo, ForwardStatus, ResolvedTarget,
};
