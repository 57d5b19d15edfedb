// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tally shell` command implementation.
//!
//! Interactive client with a colored prompt and readline history. Fetches
//! the counter once at start, then increments or resets it on request.
//! Network failures are logged and the last good value stays on screen.

use std::str::FromStr;
use std::time::Duration;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use strum::EnumString;
use tally_client::CounterClient;
use tally_client::ui::{Action, CounterIntent, CounterReducer, CounterView, Reducer, render};
use tally_config::TallyConfig;
use tally_core::{Increment, TallyError};
use tracing::{debug, warn};

/// A line of shell input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
enum Command {
    #[strum(serialize = "+", serialize = "inc", serialize = "increment")]
    Increment,
    #[strum(serialize = "reset", serialize = "0")]
    Reset,
    #[strum(serialize = "refresh", serialize = "r")]
    Refresh,
    #[strum(serialize = "help", serialize = "?")]
    Help,
    #[strum(serialize = "/quit", serialize = "/exit", serialize = "quit")]
    Quit,
}

/// The client plus what it currently shows.
struct ShellSession {
    client: CounterClient,
    view: CounterView,
}

impl ShellSession {
    fn new(client: CounterClient) -> Self {
        Self {
            client,
            view: CounterView::default(),
        }
    }

    fn apply(&mut self, intent: CounterIntent) {
        let current = std::mem::take(&mut self.view);
        self.view = CounterReducer::reduce(current, intent);
    }

    /// Fetch the counter. Ignored while a mutation is in flight.
    async fn load(&mut self) {
        if self.view.pending().is_some() {
            return;
        }
        let intent = match self.client.get().await {
            Ok(counter) => CounterIntent::Loaded(counter),
            Err(e) => {
                warn!(error = %e, "failed to load counter");
                CounterIntent::LoadFailed
            }
        };
        self.apply(intent);
    }

    /// Run `action` if the view accepts it. Returns false when it was ignored.
    async fn request(&mut self, action: Action) -> bool {
        if !self.view.actions_enabled() {
            debug!(?action, "action ignored, view not idle");
            return false;
        }
        self.apply(CounterIntent::Requested(action));
        println!("{}", render(&self.view).dimmed());

        let result = match action {
            Action::Increment => self.client.increment(Increment::ONE).await,
            Action::Reset => self.client.reset(0).await,
        };
        let intent = match result {
            Ok(counter) => CounterIntent::Completed(counter),
            Err(e) => {
                warn!(error = %e, ?action, "counter update failed");
                CounterIntent::Failed
            }
        };
        self.apply(intent);
        true
    }
}

fn print_help() {
    println!("  {}        increment by one", "+ | inc".yellow());
    println!("  {}      reset to zero", "reset | 0".yellow());
    println!("  {}    fetch the current value", "refresh".yellow());
    println!("  {}      exit", "/quit".yellow());
}

fn print_view(view: &CounterView) {
    match view.counter() {
        Some(_) => println!("{}", render(view).bold()),
        None => println!("{}", render(view).dimmed()),
    }
}

/// Runs the `tally shell` interactive client.
pub async fn run_shell(config: &TallyConfig, url: Option<&str>) -> Result<(), TallyError> {
    let url = url.unwrap_or(&config.client.url);
    let client = CounterClient::new(url, Duration::from_secs(config.client.timeout_secs))?;
    let mut session = ShellSession::new(client);

    let mut rl = DefaultEditor::new()
        .map_err(|e| TallyError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{} {}", "tally shell".bold().green(), url.dimmed());
    println!("Type {} for commands, {} to exit.\n", "help".yellow(), "/quit".yellow());

    session.load().await;
    print_view(&session.view);

    let prompt = format!("{}> ", "tally".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let Ok(command) = Command::from_str(trimmed) else {
                    eprintln!("{}: unknown command {trimmed:?}, try {}", "error".red(), "help".yellow());
                    continue;
                };

                match command {
                    Command::Quit => break,
                    Command::Help => print_help(),
                    Command::Refresh => {
                        session.load().await;
                        print_view(&session.view);
                    }
                    Command::Increment | Command::Reset => {
                        let action = if command == Command::Increment {
                            Action::Increment
                        } else {
                            Action::Reset
                        };
                        if !session.request(action).await {
                            eprintln!("{}", "counter not loaded yet, try refresh".yellow());
                        }
                        print_view(&session.view);
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}
