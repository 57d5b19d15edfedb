// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Tally.
//!
//! Provides the counter model, validated operation inputs, the error type,
//! and the adapter traits implemented by storage backends.

pub mod error;
pub mod traits;
pub mod types;

pub use error::TallyError;
pub use types::{Counter, HealthStatus, Increment, IncrementCounterInput, ResetCounterInput};

pub use traits::{PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_error_variants_render() {
        let storage = TallyError::storage(std::io::Error::other("disk gone"));
        assert_eq!(storage.to_string(), "storage error: disk gone");

        let overflow = TallyError::Overflow {
            value: i64::MAX,
            increment: 1,
        };
        assert!(overflow.to_string().contains("exceeds the maximum value"));

        let transport = TallyError::Transport {
            message: "connection refused".into(),
            source: None,
        };
        assert_eq!(transport.to_string(), "transport error: connection refused");

        let _config = TallyError::Config("test".into());
        let _validation = TallyError::Validation("test".into());
        let _internal = TallyError::Internal("test".into());
    }

    #[test]
    fn adapter_traits_are_object_safe() {
        fn _assert_plugin_adapter(_: &dyn PluginAdapter) {}
        fn _assert_storage_adapter(_: &dyn StorageAdapter) {}
    }
}
