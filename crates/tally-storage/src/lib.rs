// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Tally counter.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! connection via `tokio-rusqlite`, and the atomic counter operations behind
//! [`tally_core::StorageAdapter`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
