// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Tally counter.
//!
//! Exposes `getCounter`, `incrementCounter`, and `resetCounter` as JSON
//! procedures over axum, plus an unauthenticated `/health` endpoint.
//! Request bodies are validated here, before the service is invoked.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, router, start_server};
