use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, SessionState, TimerSettings};

/// Every state change in the system produces an Event.
/// The front end renders them; the session controller reacts to completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero, or the user confirmed a skip.
    IntervalCompleted {
        from: Mode,
        to: Mode,
        /// Focus minutes to credit to today; `None` when leaving a break.
        credited_minutes: Option<u32>,
        completed_focus_count: u64,
        skipped: bool,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: Mode,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        settings: TimerSettings,
        at: DateTime<Utc>,
    },
    ContributionRecorded {
        day: NaiveDate,
        minutes: u32,
        day_total: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: SessionState,
        settings: TimerSettings,
        total_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short machine-friendly name, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerReset { .. } => "timer_reset",
            Event::IntervalCompleted { .. } => "interval_completed",
            Event::ModeChanged { .. } => "mode_changed",
            Event::SettingsChanged { .. } => "settings_changed",
            Event::ContributionRecorded { .. } => "contribution_recorded",
            Event::StateSnapshot { .. } => "state_snapshot",
        }
    }
}
