// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counter view: Loading, Idle, and Busy.

use chrono::{DateTime, Local, TimeZone, Utc};
use tally_core::Counter;

use super::{Intent, Reducer, UiState};

/// A mutation the user can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Add one.
    Increment,
    /// Set to zero.
    Reset,
}

impl Action {
    /// Label shown while the action is in flight. Reset only disables input.
    pub fn progress_label(self) -> Option<&'static str> {
        match self {
            Action::Increment => Some("Updating..."),
            Action::Reset => None,
        }
    }
}

/// What the client currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CounterView {
    /// No counter fetched yet.
    #[default]
    Loading,
    /// Counter shown, actions enabled.
    Idle { counter: Counter },
    /// A mutation is in flight; actions are disabled.
    Busy { counter: Counter, action: Action },
}

impl UiState for CounterView {}

impl CounterView {
    /// The last known counter, if any.
    pub fn counter(&self) -> Option<&Counter> {
        match self {
            CounterView::Loading => None,
            CounterView::Idle { counter } | CounterView::Busy { counter, .. } => Some(counter),
        }
    }

    /// Whether increment and reset are currently accepted.
    pub fn actions_enabled(&self) -> bool {
        matches!(self, CounterView::Idle { .. })
    }

    /// The action in flight, if any.
    pub fn pending(&self) -> Option<Action> {
        match self {
            CounterView::Busy { action, .. } => Some(*action),
            _ => None,
        }
    }
}

/// Inputs to the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterIntent {
    /// A fetch of the counter succeeded.
    Loaded(Counter),
    /// A fetch failed. The error has already been reported.
    LoadFailed,
    /// The user asked for a mutation.
    Requested(Action),
    /// The in-flight mutation returned the updated counter.
    Completed(Counter),
    /// The in-flight mutation failed. The error has already been reported.
    Failed,
}

impl Intent for CounterIntent {}

pub struct CounterReducer;

impl Reducer for CounterReducer {
    type State = CounterView;
    type Intent = CounterIntent;

    fn reduce(state: CounterView, intent: CounterIntent) -> CounterView {
        use CounterIntent as I;
        use CounterView as V;

        match (state, intent) {
            (V::Loading | V::Idle { .. }, I::Loaded(counter)) => V::Idle { counter },
            (V::Idle { counter }, I::Requested(action)) => V::Busy { counter, action },
            (V::Busy { .. }, I::Completed(counter)) => V::Idle { counter },
            (V::Busy { counter, .. }, I::Failed) => V::Idle { counter },
            // Loading stays Loading on failure; actions while Loading or Busy
            // are ignored; stray outcomes leave the state alone.
            (state, _) => state,
        }
    }
}

/// Render a UTC timestamp as wall-clock time in `tz`.
pub fn format_time<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format("%H:%M:%S").to_string()
}

/// Render the view as plain text lines.
pub fn render(view: &CounterView) -> String {
    match view {
        CounterView::Loading => "Loading counter...".to_string(),
        CounterView::Idle { counter } => format!(
            "Counter: {}\nUpdated: {}",
            counter.value,
            format_time(&counter.updated_at, &Local)
        ),
        CounterView::Busy { counter, action } => {
            let mut text = format!(
                "Counter: {}\nUpdated: {}",
                counter.value,
                format_time(&counter.updated_at, &Local)
            );
            if let Some(label) = action.progress_label() {
                text.push('\n');
                text.push_str(label);
            }
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn counter(value: i64) -> Counter {
        Counter {
            id: 1,
            value,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 30, 5).unwrap(),
        }
    }

    fn reduce(state: CounterView, intent: CounterIntent) -> CounterView {
        CounterReducer::reduce(state, intent)
    }

    #[test]
    fn initial_state_is_loading() {
        assert_eq!(CounterView::default(), CounterView::Loading);
        assert!(!CounterView::Loading.actions_enabled());
    }

    #[test]
    fn load_success_moves_to_idle() {
        let state = reduce(CounterView::Loading, CounterIntent::Loaded(counter(3)));
        assert_eq!(state, CounterView::Idle { counter: counter(3) });
        assert!(state.actions_enabled());
    }

    #[test]
    fn load_failure_stays_loading() {
        assert_eq!(
            reduce(CounterView::Loading, CounterIntent::LoadFailed),
            CounterView::Loading
        );
    }

    #[test]
    fn actions_are_ignored_while_loading() {
        for action in [Action::Increment, Action::Reset] {
            assert_eq!(
                reduce(CounterView::Loading, CounterIntent::Requested(action)),
                CounterView::Loading
            );
        }
    }

    #[test]
    fn request_from_idle_goes_busy_then_back() {
        let idle = CounterView::Idle { counter: counter(10) };
        let busy = reduce(idle, CounterIntent::Requested(Action::Increment));
        assert_eq!(busy.pending(), Some(Action::Increment));
        assert!(!busy.actions_enabled());
        assert_eq!(busy.counter(), Some(&counter(10)));

        let done = reduce(busy, CounterIntent::Completed(counter(11)));
        assert_eq!(done, CounterView::Idle { counter: counter(11) });
    }

    #[test]
    fn second_request_while_busy_is_ignored() {
        let busy = CounterView::Busy {
            counter: counter(4),
            action: Action::Reset,
        };
        let next = reduce(busy.clone(), CounterIntent::Requested(Action::Increment));
        assert_eq!(next, busy);
    }

    #[test]
    fn failed_mutation_keeps_previous_counter() {
        let busy = CounterView::Busy {
            counter: counter(4),
            action: Action::Increment,
        };
        assert_eq!(
            reduce(busy, CounterIntent::Failed),
            CounterView::Idle { counter: counter(4) }
        );
    }

    #[test]
    fn refresh_while_idle_replaces_counter() {
        let idle = CounterView::Idle { counter: counter(1) };
        assert_eq!(
            reduce(idle.clone(), CounterIntent::Loaded(counter(9))),
            CounterView::Idle { counter: counter(9) }
        );
        assert_eq!(reduce(idle.clone(), CounterIntent::LoadFailed), idle);
    }

    #[test]
    fn completion_without_request_is_ignored() {
        let idle = CounterView::Idle { counter: counter(1) };
        assert_eq!(reduce(idle.clone(), CounterIntent::Completed(counter(2))), idle);
    }

    #[test]
    fn time_is_rendered_in_the_given_zone() {
        let ts = counter(0).updated_at;
        assert_eq!(format_time(&ts, &Utc), "12:30:05");
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(format_time(&ts, &plus_two), "14:30:05");
    }

    #[test]
    fn render_shows_value_and_progress() {
        assert_eq!(render(&CounterView::Loading), "Loading counter...");

        let idle = render(&CounterView::Idle { counter: counter(-7) });
        assert!(idle.starts_with("Counter: -7\nUpdated: "));

        let busy = render(&CounterView::Busy {
            counter: counter(2),
            action: Action::Increment,
        });
        assert!(busy.ends_with("Updating..."));

        let resetting = render(&CounterView::Busy {
            counter: counter(2),
            action: Action::Reset,
        });
        assert!(!resetting.contains("..."), "{resetting}");
        assert_eq!(resetting.lines().count(), 2);
    }
}
