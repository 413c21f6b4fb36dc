// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the monitor's durable state.

pub mod checkpoint;
pub mod control;
pub mod events;
pub mod keywords;
pub mod ledger;
pub mod retention;
pub mod status;
