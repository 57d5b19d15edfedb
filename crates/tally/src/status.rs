// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally status` command implementation.
//!
//! Queries the health endpoint and the counter of a running server. Falls
//! back gracefully when nothing is listening.

use std::io::IsTerminal;
use std::time::Duration;

use serde::Serialize;
use tally_client::{CounterClient, HealthReport};
use tally_config::TallyConfig;
use tally_core::TallyError;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub status: String,
    pub storage: Option<String>,
    pub value: Option<i64>,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub url: String,
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn build_status(url: &str, health: Option<HealthReport>, value: Option<i64>) -> StatusResponse {
    match health {
        Some(health) => StatusResponse {
            running: true,
            status: health.status,
            storage: Some(health.storage),
            value,
            uptime_secs: Some(health.uptime_secs),
            uptime_human: Some(format_uptime(health.uptime_secs)),
            url: url.to_string(),
        },
        None => StatusResponse {
            running: false,
            status: "not running".to_string(),
            storage: None,
            value: None,
            uptime_secs: None,
            uptime_human: None,
            url: url.to_string(),
        },
    }
}

/// Run the `tally status` command.
///
/// If `json` is set, outputs structured JSON for scripting. If `plain` is set
/// or stdout is not a TTY, disables colors.
pub async fn run_status(config: &TallyConfig, json: bool, plain: bool) -> Result<(), TallyError> {
    let client = CounterClient::new(&config.client.url, Duration::from_secs(3))?;

    let health = client.health().await.ok();
    let value = match health {
        Some(_) => client.get().await.ok().map(|c| c.value),
        None => None,
    };
    let status = build_status(client.base_url(), health, value);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  tally status");
    println!("  {}", "-".repeat(35));

    if !status.running {
        if use_color {
            println!("    State:    {} {}", "✗".red(), "not running".red());
        } else {
            println!("    State:    [FAIL] not running");
        }
        println!("    Endpoint: {}/health", status.url);
        println!();
        println!("  Start with: tally serve");
        println!();
        return;
    }

    let uptime = status.uptime_human.as_deref().unwrap_or("-");
    if use_color {
        println!(
            "    State:    {} {} (uptime: {uptime})",
            "✓".green(),
            status.status.green()
        );
    } else {
        println!("    State:    [OK] {} (uptime: {uptime})", status.status);
    }
    println!(
        "    Storage:  {}",
        status.storage.as_deref().unwrap_or("unknown")
    );
    match status.value {
        Some(value) => println!("    Counter:  {value}"),
        None => println!("    Counter:  unavailable"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_uptime_minutes() {
        assert_eq!(format_uptime(120), "2m");
    }

    #[test]
    fn format_uptime_hours() {
        assert_eq!(format_uptime(3720), "1h 2m");
    }

    #[test]
    fn format_uptime_days() {
        assert_eq!(format_uptime(90060), "1d 1h 1m");
    }

    #[test]
    fn running_status_serializes() {
        let health = HealthReport {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            uptime_secs: 3600,
            storage: "ok".to_string(),
        };
        let resp = build_status("http://127.0.0.1:3000", Some(health), Some(12));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"running\":true"));
        assert!(json.contains("\"value\":12"));
        assert!(json.contains("\"uptime_human\":\"1h 0m\""));
    }

    #[test]
    fn offline_status_serializes() {
        let resp = build_status("http://127.0.0.1:3000", None, None);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"running\":false"));
        assert!(json.contains("\"value\":null"));
    }
}
