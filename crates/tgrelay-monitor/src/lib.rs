// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Monitoring core for tgrelay.
//!
//! The [`Supervisor`] owns the account-session connection lifecycle: it
//! polls control state, connects through a [`GatewayConnector`], resolves
//! the relay target by title, and installs the [`EventDispatcher`] on the
//! live update stream. The [`RetentionCleaner`] prunes old rows on a daily
//! schedule, independent of the supervisor.
//!
//! [`GatewayConnector`]: tgrelay_core::GatewayConnector

pub mod cleaner;
pub mod dispatcher;
pub mod resolver;
pub mod supervisor;

pub use cleaner::RetentionCleaner;
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use supervisor::{MonitorHandle, Supervisor, SupervisorState};
