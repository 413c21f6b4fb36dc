// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic test doubles for the tgrelay monitor: an in-memory
//! [`Repository`](tgrelay_core::Repository) and a scripted mock
//! [`Gateway`](tgrelay_core::Gateway)/connector pair.

pub mod memory_repository;
pub mod mock_gateway;

pub use memory_repository::MemoryRepository;
pub use mock_gateway::{MockConnector, MockGateway};
