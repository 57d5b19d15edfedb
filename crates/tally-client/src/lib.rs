// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client side of Tally: an HTTP client for the counter procedures and the
//! pure view state machine the interactive shell drives.

pub mod client;
pub mod ui;

pub use client::{CounterClient, HealthReport};
