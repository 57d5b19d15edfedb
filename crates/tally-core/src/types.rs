// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The counter model and the typed inputs accepted by its operations.

use chrono::{DateTime, Utc};
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TallyError;

/// The single persisted counter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Store-assigned identifier.
    pub id: i64,
    /// Current value. Unbounded apart from the `i64` range; may be negative.
    pub value: i64,
    /// Time of the last insert or update, set by the store.
    pub updated_at: DateTime<Utc>,
}

/// A validated, strictly positive increment amount.
///
/// Only constructible through [`Increment::new`], so everything past the
/// validation boundary can rely on `get() > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Increment(i64);

impl Increment {
    /// An increment of one, the default for `incrementCounter`.
    pub const ONE: Increment = Increment(1);

    /// Validate a raw amount.
    pub fn new(amount: i64) -> Result<Self, TallyError> {
        if amount <= 0 {
            return Err(TallyError::Validation(format!(
                "increment must be a positive integer, got {amount}"
            )));
        }
        Ok(Self(amount))
    }

    /// The wrapped amount.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for Increment {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<i64> for Increment {
    type Error = TallyError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

/// Accepts any JSON number with no fractional part that fits in `i64`, so
/// `2`, `2.0`, and `-1e1` all decode. Strings, booleans, and `1.5` do not.
fn integral<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    struct IntegralVisitor;

    impl Visitor<'_> for IntegralVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::custom(format!("integer {v} is out of range")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            // 2^63 itself is out of range, hence the strict upper bound.
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::custom(format!("expected an integer, got {v}")))
            }
        }
    }

    deserializer.deserialize_any(IntegralVisitor)
}

/// Request body for `incrementCounter`. Unrecognized keys are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementCounterInput {
    /// Amount to add. Defaults to 1 when omitted.
    #[serde(default = "default_increment", deserialize_with = "integral")]
    pub increment: i64,
}

impl IncrementCounterInput {
    /// Check the declared constraints and produce the typed increment.
    pub fn validate(&self) -> Result<Increment, TallyError> {
        Increment::new(self.increment)
    }
}

impl Default for IncrementCounterInput {
    fn default() -> Self {
        Self {
            increment: default_increment(),
        }
    }
}

fn default_increment() -> i64 {
    1
}

/// Request body for `resetCounter`. Unrecognized keys are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetCounterInput {
    /// New value. Any integer, defaults to 0 when omitted.
    #[serde(default, deserialize_with = "integral")]
    pub value: i64,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    /// Short label used in health endpoint payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "ok",
            Self::Degraded(_) => "degraded",
            Self::Unhealthy(_) => "unhealthy",
        }
    }
}
