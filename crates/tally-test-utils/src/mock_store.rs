// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory storage adapter for deterministic testing.
//!
//! `MockStore` keeps the counter behind a mutex, follows the same
//! create-on-first-access and overflow rules as the SQLite store, and can be
//! switched into a failing mode to exercise error paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use tally_core::{Counter, HealthStatus, Increment, PluginAdapter, StorageAdapter, TallyError};

/// A mock counter store for testing.
#[derive(Default)]
pub struct MockStore {
    counter: Mutex<Option<Counter>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a counter with `value`.
    pub fn with_value(value: i64) -> Self {
        Self {
            counter: Mutex::new(Some(Counter {
                id: 1,
                value,
                updated_at: Utc::now(),
            })),
            ..Self::default()
        }
    }

    /// Make every subsequent counter operation fail with a storage error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of counter operations that reached the store.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The stored counter, without creating one.
    pub async fn snapshot(&self) -> Option<Counter> {
        self.counter.lock().await.clone()
    }

    async fn apply(
        &self,
        mutate: impl FnOnce(Option<i64>) -> Result<i64, TallyError>,
    ) -> Result<Counter, TallyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TallyError::storage(std::io::Error::other(
                "mock store unavailable",
            )));
        }

        let mut slot = self.counter.lock().await;
        let previous = slot.as_ref();
        let value = mutate(previous.map(|c| c.value))?;
        let updated_at = next_timestamp(previous.map(|c| c.updated_at));
        let counter = Counter {
            id: previous.map_or(1, |c| c.id),
            value,
            updated_at,
        };
        *slot = Some(counter.clone());
        Ok(counter)
    }
}

fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev + TimeDelta::milliseconds(1),
        _ => now,
    }
}

#[async_trait]
impl PluginAdapter for MockStore {
    fn name(&self) -> &str {
        "mock-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("mock store unavailable".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MockStore {
    async fn initialize(&self) -> Result<(), TallyError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), TallyError> {
        Ok(())
    }

    async fn get_or_create_counter(&self) -> Result<Counter, TallyError> {
        {
            let slot = self.counter.lock().await;
            if let Some(existing) = slot.as_ref()
                && !self.failing.load(Ordering::SeqCst)
            {
                self.calls.fetch_add(1, Ordering::SeqCst);
                return Ok(existing.clone());
            }
        }
        self.apply(|current| Ok(current.unwrap_or(0))).await
    }

    async fn increment_counter(&self, by: Increment) -> Result<Counter, TallyError> {
        self.apply(|current| match current {
            None => Ok(by.get()),
            Some(value) => value.checked_add(by.get()).ok_or(TallyError::Overflow {
                value,
                increment: by.get(),
            }),
        })
        .await
    }

    async fn reset_counter(&self, value: i64) -> Result<Counter, TallyError> {
        self.apply(|_| Ok(value)).await
    }
}
