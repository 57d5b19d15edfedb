// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Tally.

use thiserror::Error;

/// The primary error type used across the store, service, API, and client.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected before it reached the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An increment would push the counter past `i64::MAX`. The row is unchanged.
    #[error("counter overflow: {value} + {increment} exceeds the maximum value")]
    Overflow { value: i64, increment: i64 },

    /// Client-side network or protocol failure talking to the API.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TallyError {
    /// Shorthand for wrapping any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
