use std::time::Duration;

use chrono::NaiveDate;

use crate::config::DASHBOARD;
use crate::utils::{AppInstant, clamp_date, parse_date_input};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Result of offering a raw date to the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Accepted as-is; a fresh quiet period started.
    Accepted(NaiveDate),
    /// Out of range, pulled to the nearest bound, then accepted.
    Clamped(NaiveDate),
    /// Unparseable. Nothing changed.
    Rejected,
}

/// Debounced date selection held as explicit timer state.
///
/// `raw` follows every input immediately. `settled` only moves after `raw` has been
/// quiet for the full delay. Each new input replaces the single pending deadline, so a
/// burst of edits yields at most one settled update and a selector still being edited
/// yields none.
#[derive(Debug, Clone)]
pub struct DebouncedSelector {
    raw: NaiveDate,
    settled: NaiveDate,
    /// The one pending timer. Replaced on every input, cleared when it fires.
    deadline: Option<AppInstant>,
    delay: Duration,
    min: NaiveDate,
    max: NaiveDate,
}

impl DebouncedSelector {
    /// Starts settled on `initial` (clamped into `[min, max]`) with no timer running.
    pub fn new(initial: NaiveDate, min: NaiveDate, max: NaiveDate) -> Self {
        Self::with_delay(initial, min, max, DASHBOARD.debounce)
    }

    pub fn with_delay(initial: NaiveDate, min: NaiveDate, max: NaiveDate, delay: Duration) -> Self {
        let start = clamp_date(initial, min, max);
        Self {
            raw: start,
            settled: start,
            deadline: None,
            delay,
            min,
            max,
        }
    }

    pub fn raw(&self) -> NaiveDate {
        self.raw
    }

    pub fn settled(&self) -> NaiveDate {
        self.settled
    }

    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        (self.min, self.max)
    }

    /// Moves the upper bound (e.g. when "yesterday" rolls over). Existing values are re-clamped.
    pub fn set_bounds(&mut self, min: NaiveDate, max: NaiveDate) {
        self.min = min;
        self.max = max;
        self.raw = clamp_date(self.raw, min, max);
        self.settled = clamp_date(self.settled, min, max);
    }

    /// The instant the pending timer fires, if one is running.
    pub fn deadline(&self) -> Option<AppInstant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Parses a raw input string then behaves like [`DebouncedSelector::select`].
    pub fn select_input(&mut self, input: &str, now: AppInstant) -> SelectOutcome {
        match parse_date_input(input) {
            Ok(date) => self.select(date, now),
            Err(_e) => {
                #[cfg(debug_assertions)]
                if DF.log_debounce {
                    log::debug!("DEBOUNCE: rejected input: {}", _e);
                }
                SelectOutcome::Rejected
            }
        }
    }

    /// Records a new raw date and restarts the timer, cancelling any pending one.
    pub fn select(&mut self, date: NaiveDate, now: AppInstant) -> SelectOutcome {
        let clamped = clamp_date(date, self.min, self.max);
        self.raw = clamped;
        self.deadline = Some(now + self.delay);

        #[cfg(debug_assertions)]
        if DF.log_debounce {
            log::debug!("DEBOUNCE: raw -> {} (fires in {:?})", clamped, self.delay);
        }

        if clamped == date {
            SelectOutcome::Accepted(clamped)
        } else {
            SelectOutcome::Clamped(clamped)
        }
    }

    /// Fires the timer if its deadline has passed. Returns the new settled date when it fired.
    pub fn poll(&mut self, now: AppInstant) -> Option<NaiveDate> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;

        if self.settled == self.raw {
            return None;
        }
        self.settled = self.raw;

        #[cfg(debug_assertions)]
        if DF.log_debounce {
            log::debug!("DEBOUNCE: settled -> {}", self.settled);
        }
        Some(self.settled)
    }

    /// Time left until the pending timer fires.
    pub fn remaining(&self, now: AppInstant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}
