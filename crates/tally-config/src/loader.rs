// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tally.toml` > `~/.config/tally/tally.toml` > `/etc/tally/tally.toml`
//! with environment variable overrides via the `TALLY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TallyConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tally/tally.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "tally.toml";

/// Sections that env var keys are split on. Keys inside a section may contain
/// underscores, so the split happens only once, after the section name.
const SECTIONS: &[&str] = &["log", "storage", "gateway", "client"];

/// The user config file under the XDG config directory, if one is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tally").join("tally.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tally/tally.toml`
/// 3. `~/.config/tally/tally.toml`
/// 4. `./tally.toml`
/// 5. `TALLY_*` environment variables
pub fn load_config() -> Result<TallyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TallyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TallyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TallyConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `TALLY_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `TALLY_STORAGE_DATABASE_PATH`
/// must become `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TALLY_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
