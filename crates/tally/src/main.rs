// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tally - a persistent counter with an HTTP API and an interactive client.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shell;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tally_config::TallyConfig;

/// Tally - a persistent counter with an HTTP API and an interactive client.
#[derive(Parser, Debug)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the counter API server.
    Serve,
    /// Launch the interactive counter client.
    Shell {
        /// Server base URL (overrides `client.url`).
        #[arg(long)]
        url: Option<String>,
    },
    /// Show whether a server is running and the current value.
    Status {
        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

fn load_config(path: Option<&std::path::Path>) -> TallyConfig {
    let loaded = match path {
        Some(path) => tally_config::load_and_validate_path(path),
        None => tally_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            tally_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => {
            serve::init_tracing(&config.log.level);
            serve::run_serve(config).await
        }
        Some(Commands::Shell { url }) => {
            serve::init_tracing(&config.log.level);
            shell::run_shell(&config, url.as_deref()).await
        }
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        None => {
            println!("tally: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn defaults_are_valid() {
        let config = tally_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.gateway.port, 3000);
    }

    #[test]
    fn parses_shell_with_url_and_global_config() {
        let cli = Cli::try_parse_from([
            "tally",
            "shell",
            "--url",
            "http://10.0.0.2:3000",
            "--config",
            "/tmp/tally.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/tally.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Shell { url: Some(ref u) }) if u == "http://10.0.0.2:3000"
        ));
    }

    #[test]
    fn parses_status_flags() {
        let cli = Cli::try_parse_from(["tally", "status", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Status {
                json: true,
                plain: false
            })
        ));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["tally", "frobnicate"]).is_err());
    }
}
