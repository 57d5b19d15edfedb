// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles storage, the counter service, and the HTTP router.
//! By default storage is a temp SQLite database; `with_mock_store` swaps in a
//! [`MockStore`]. `spawn_server` serves the router on an ephemeral port so
//! HTTP clients can be driven against it.

use std::sync::Arc;

use axum::Router;
use tally_config::model::StorageConfig;
use tally_core::{StorageAdapter, TallyError};
use tally_gateway::{GatewayState, router};
use tally_service::CounterService;
use tally_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;

use crate::mock_store::MockStore;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    mock_store: Option<Arc<MockStore>>,
    initial_value: Option<i64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            mock_store: None,
            initial_value: None,
        }
    }

    /// Back the service with `store` instead of SQLite.
    pub fn with_mock_store(mut self, store: Arc<MockStore>) -> Self {
        self.mock_store = Some(store);
        self
    }

    /// Seed the counter with `value` before the harness is returned.
    pub fn with_initial_value(mut self, value: i64) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, TallyError> {
        let temp_dir = tempfile::TempDir::new().map_err(TallyError::storage)?;

        let storage: Arc<dyn StorageAdapter> = match self.mock_store {
            Some(store) => store as Arc<dyn StorageAdapter>,
            None => {
                let config = StorageConfig {
                    database_path: temp_dir
                        .path()
                        .join("test.db")
                        .to_string_lossy()
                        .into_owned(),
                    ..StorageConfig::default()
                };
                let storage = SqliteStorage::new(config);
                storage.initialize().await?;
                Arc::new(storage)
            }
        };

        let service = CounterService::new(storage);
        if let Some(value) = self.initial_value {
            service.reset(value).await?;
        }

        Ok(TestHarness {
            service,
            shutdown: CancellationToken::new(),
            _temp_dir: temp_dir,
        })
    }
}

/// A complete Tally stack for integration tests.
///
/// Dropping the harness stops any server started with `spawn_server` and
/// removes the temp database.
pub struct TestHarness {
    service: CounterService,
    shutdown: CancellationToken,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The counter service under test.
    pub fn service(&self) -> &CounterService {
        &self.service
    }

    /// A fresh router over the harness's service.
    pub fn app(&self) -> Router {
        router(GatewayState::new(self.service.clone()))
    }

    /// Serve the router on `127.0.0.1:0` and return its base URL.
    pub async fn spawn_server(&self) -> Result<String, TallyError> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| TallyError::Internal(format!("failed to bind test server: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| TallyError::Internal(format!("no local address: {e}")))?;

        let app = self.app();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = served {
                tracing::warn!(error = %e, "test server stopped with error");
            }
        });

        Ok(format!("http://{addr}"))
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
