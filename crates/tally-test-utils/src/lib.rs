// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tally integration tests.
//!
//! Provides an in-memory store and a harness that assembles the full
//! storage, service, and gateway stack for fast, deterministic tests.
//!
//! # Components
//!
//! - [`MockStore`] - In-memory counter store with failure injection
//! - [`TestHarness`] - Service and router over a temp SQLite database or a `MockStore`

pub mod harness;
pub mod mock_store;

pub use harness::TestHarness;
pub use mock_store::MockStore;
