// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unidirectional view state for the counter client.
//!
//! ```text
//! Intent ──→ Reducer ──→ State ──→ render
//!    ↑                              │
//!    └──────── user / network ──────┘
//! ```
//!
//! The reducer is the only place state changes. It is pure; the shell
//! performs the HTTP calls and feeds their outcomes back in as intents.

mod counter;

pub use counter::{Action, CounterIntent, CounterReducer, CounterView, format_time, render};

/// Marker trait for UI state objects.
pub trait UiState: Clone + PartialEq + Default + Send + 'static {}

/// Marker trait for user actions and network outcomes.
pub trait Intent: Send + 'static {}

/// Transforms state based on intents.
pub trait Reducer {
    type State: UiState;
    type Intent: Intent;

    /// Process an intent and return the new state. No side effects.
    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
