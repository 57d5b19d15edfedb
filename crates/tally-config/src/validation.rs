// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express, such
//! as bindable hosts, non-empty paths, and well-formed client URLs.

use crate::diagnostic::ConfigError;
use crate::model::TallyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TallyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.gateway.port == 0 {
        errors.push(ConfigError::Validation {
            message: "gateway.port must be between 1 and 65535".to_string(),
        });
    }

    let url = config.client.url.trim();
    let authority = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match authority {
        Some(rest) if !rest.trim_end_matches('/').is_empty() => {}
        _ => errors.push(ConfigError::Validation {
            message: format!("client.url `{url}` must be an http:// or https:// URL"),
        }),
    }

    if config.client.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "client.timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        let config = TallyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = TallyConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn bad_host_and_zero_port_are_both_reported() {
        let mut config = TallyConfig::default();
        config.gateway.host = "not a host!".to_string();
        config.gateway.port = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2, "got: {:?}", messages(&errors));
    }

    #[test]
    fn client_url_must_be_http() {
        let mut config = TallyConfig::default();
        config.client.url = "ftp://example.com".to_string();
        assert!(validate_config(&config).is_err());

        config.client.url = "http://".to_string();
        assert!(validate_config(&config).is_err());

        config.client.url = "https://counter.example.com/".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = TallyConfig::default();
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors)[0].contains("log.level"));
    }

    #[test]
    fn zero_client_timeout_fails_validation() {
        let mut config = TallyConfig::default();
        config.client.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn sections_deny_unknown_fields() {
        let toml_str = r#"
[gateway]
host = "0.0.0.0"
prot = 8080
"#;
        assert!(toml::from_str::<TallyConfig>(toml_str).is_err());
    }
}
