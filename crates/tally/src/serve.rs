// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally serve` command implementation.
//!
//! Opens storage, builds the counter service, and serves the HTTP API until
//! SIGINT or SIGTERM, then checkpoints the database.

use std::sync::Arc;

use tally_config::TallyConfig;
use tally_core::{StorageAdapter, TallyError};
use tally_gateway::GatewayState;
use tally_service::CounterService;
use tally_storage::SqliteStorage;
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `tally serve` command.
pub async fn run_serve(config: TallyConfig) -> Result<(), TallyError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
    info!(path = %config.storage.database_path, "storage ready");

    let service = CounterService::new(storage.clone());
    let cancel = shutdown::install_signal_handler();

    let served = tally_gateway::start_server(&config.gateway, GatewayState::new(service), cancel).await;

    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
    info!("tally stopped");
    served
}

/// Workspace crates that log at the configured level; everything else at warn.
const LOG_TARGETS: &[&str] = &[
    "tally",
    "tally_core",
    "tally_config",
    "tally_storage",
    "tally_service",
    "tally_gateway",
    "tally_client",
    "tally_test_utils",
];

fn default_filter(log_level: &str) -> String {
    let mut directives: Vec<String> = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the config level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
