// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits between the monitor core and its external collaborators:
//! the durable store and the messaging backend.

pub mod gateway;
pub mod repository;

pub use gateway::{Gateway, GatewayConnector};
pub use repository::Repository;
