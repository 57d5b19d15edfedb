// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter business logic.
//!
//! [`CounterService`] exposes get, increment, and reset over any
//! [`StorageAdapter`]. The adapter owns atomicity and the exactly-one-counter
//! invariant; the service logs outcomes and propagates store failures
//! unchanged.

use std::sync::Arc;

use tally_core::{Counter, HealthStatus, Increment, StorageAdapter, TallyError};
use tracing::{error, info};

/// The counter operations, shared across request handlers.
#[derive(Clone)]
pub struct CounterService {
    storage: Arc<dyn StorageAdapter>,
}

impl CounterService {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Return the counter, creating it with value 0 on first access.
    pub async fn get(&self) -> Result<Counter, TallyError> {
        self.storage
            .get_or_create_counter()
            .await
            .inspect_err(|e| error!(error = %e, "get counter failed"))
    }

    /// Add `by` to the counter.
    pub async fn increment(&self, by: Increment) -> Result<Counter, TallyError> {
        let counter = self
            .storage
            .increment_counter(by)
            .await
            .inspect_err(|e| error!(error = %e, increment = by.get(), "counter increment failed"))?;
        info!(value = counter.value, increment = by.get(), "counter incremented");
        Ok(counter)
    }

    /// Overwrite the counter with `value`.
    pub async fn reset(&self, value: i64) -> Result<Counter, TallyError> {
        let counter = self
            .storage
            .reset_counter(value)
            .await
            .inspect_err(|e| error!(error = %e, value, "counter reset failed"))?;
        info!(value = counter.value, "counter reset");
        Ok(counter)
    }

    /// Storage health, folded into a status. Never fails.
    pub async fn health(&self) -> HealthStatus {
        match self.storage.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    /// The backing store, for lifecycle calls at shutdown.
    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }
}
