// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the persisted counter.

use async_trait::async_trait;

use crate::error::TallyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Counter, Increment};

/// Adapter for the counter's persistence backend.
///
/// Every counter operation must ensure the counter exists and apply its
/// mutation as one atomic step, so two first-ever calls never create two
/// rows and concurrent increments never lose an update. When more than one
/// row exists the operations act on the row with the lowest id.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection setup).
    async fn initialize(&self) -> Result<(), TallyError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), TallyError>;

    /// Returns the counter, creating it with value 0 if none exists.
    async fn get_or_create_counter(&self) -> Result<Counter, TallyError>;

    /// Adds `by` to the counter, creating it with value `by` if none exists.
    async fn increment_counter(&self, by: Increment) -> Result<Counter, TallyError>;

    /// Overwrites the counter value, creating the counter if none exists.
    async fn reset_counter(&self, value: i64) -> Result<Counter, TallyError>;
}
