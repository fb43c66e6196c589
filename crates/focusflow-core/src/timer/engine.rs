//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine over three modes. It does
//! not own a clock or a thread: the caller invokes `tick()` once per second
//! while the countdown is active.
//!
//! ## Transitions
//!
//! ```text
//! Focus --complete--> ShortBreak   (completed focus count % 4 != 0)
//! Focus --complete--> LongBreak    (completed focus count % 4 == 0)
//! ShortBreak | LongBreak --complete--> Focus
//! ```
//!
//! Entering a mode, by completion, manual switch, or settings change, always
//! restores the full duration and stops the countdown.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.toggle();
//! // Once per second:
//! if let Some(event) = engine.tick() { /* interval completed */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::settings::{Mode, TimerSettings};
use crate::error::ValidationError;
use crate::events::Event;

/// Focus intervals per cycle; the last one is followed by a long break.
pub const FOCUS_SESSIONS_PER_CYCLE: u64 = 4;

/// Snapshot of the countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub mode: Mode,
    pub seconds_remaining: u64,
    pub is_active: bool,
    /// Monotonic count of completed focus intervals.
    pub completed_focus_count: u64,
}

impl SessionState {
    /// Fresh state at the start of `mode`, stopped.
    pub fn entering(mode: Mode, settings: &TimerSettings, completed_focus_count: u64) -> Self {
        Self {
            mode,
            seconds_remaining: settings.duration_secs(mode),
            is_active: false,
            completed_focus_count,
        }
    }

    /// Position within the current four-interval cycle.
    pub fn cycle_position(&self) -> u64 {
        self.completed_focus_count % FOCUS_SESSIONS_PER_CYCLE
    }
}

/// Mode that follows a completed interval.
pub fn next_mode(from: Mode, completed_focus_count: u64) -> Mode {
    match from {
        Mode::Focus if completed_focus_count % FOCUS_SESSIONS_PER_CYCLE == 0 => Mode::LongBreak,
        Mode::Focus => Mode::ShortBreak,
        Mode::ShortBreak | Mode::LongBreak => Mode::Focus,
    }
}

/// Core timer engine.
///
/// Every command replaces `state` as a whole rather than patching fields, so a
/// snapshot taken between commands is always internally consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEngine {
    settings: TimerSettings,
    state: SessionState,
}

impl TimerEngine {
    /// Create an engine at the start of a focus interval with no history.
    pub fn new(settings: TimerSettings) -> Self {
        Self::with_count(settings, 0)
    }

    /// Create an engine at the start of a focus interval, keeping a persisted
    /// completed-focus count.
    pub fn with_count(settings: TimerSettings, completed_focus_count: u64) -> Self {
        let state = SessionState::entering(Mode::Focus, &settings, completed_focus_count);
        Self { settings, state }
    }

    /// Rebuild an engine from persisted parts.
    ///
    /// A restored countdown is never running, and its remaining time is
    /// clamped into the current mode's duration.
    pub fn restore(settings: TimerSettings, state: SessionState) -> Self {
        let max = settings.duration_secs(state.mode);
        let seconds_remaining = if state.seconds_remaining == 0 {
            max
        } else {
            state.seconds_remaining.min(max)
        };
        Self {
            settings,
            state: SessionState {
                seconds_remaining,
                is_active: false,
                ..state
            },
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.state.seconds_remaining
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn completed_focus_count(&self) -> u64 {
        self.state.completed_focus_count
    }

    pub fn total_secs(&self) -> u64 {
        self.settings.duration_secs(self.state.mode)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state.clone(),
            settings: self.settings,
            total_secs: self.total_secs(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start when stopped, pause when running.
    pub fn toggle(&mut self) -> Event {
        if self.state.is_active {
            self.set_active(false);
            Event::TimerPaused {
                mode: self.state.mode,
                seconds_remaining: self.state.seconds_remaining,
                at: Utc::now(),
            }
        } else {
            self.set_active(true);
            Event::TimerStarted {
                mode: self.state.mode,
                seconds_remaining: self.state.seconds_remaining,
                at: Utc::now(),
            }
        }
    }

    /// Start the countdown. `None` if it was already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_active {
            return None;
        }
        Some(self.toggle())
    }

    /// Pause the countdown. `None` if it was not running.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_active {
            return None;
        }
        Some(self.toggle())
    }

    /// Restore the full duration of the current mode and stop.
    pub fn reset(&mut self) -> Event {
        self.enter(self.state.mode);
        Event::TimerReset {
            mode: self.state.mode,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        }
    }

    /// Manually switch to `mode`. The counter is not touched.
    pub fn switch_mode(&mut self, mode: Mode) -> Event {
        self.enter(mode);
        Event::ModeChanged {
            mode,
            seconds_remaining: self.state.seconds_remaining,
            at: Utc::now(),
        }
    }

    /// Replace the settings wholesale. The running countdown is discarded and
    /// the current mode restarts from its new full duration.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Result<Event, ValidationError> {
        settings.validate()?;
        self.settings = settings;
        self.enter(self.state.mode);
        Ok(Event::SettingsChanged {
            settings,
            at: Utc::now(),
        })
    }

    /// Finish the current interval early.
    ///
    /// Requires explicit confirmation; an unconfirmed skip changes nothing.
    /// A confirmed skip is indistinguishable from the countdown reaching zero,
    /// including the full focus credit.
    pub fn skip(&mut self, confirmed: bool) -> Option<Event> {
        if !confirmed {
            return None;
        }
        Some(self.complete(true))
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `Some(Event::IntervalCompleted)` on the tick that reaches zero.
    /// Completion stops the countdown, so later ticks are no-ops until the
    /// caller starts the next interval.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_active {
            return None;
        }
        let seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        self.state = SessionState {
            seconds_remaining,
            ..self.state.clone()
        };
        if seconds_remaining == 0 {
            return Some(self.complete(false));
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_active(&mut self, is_active: bool) {
        self.state = SessionState {
            is_active,
            ..self.state.clone()
        };
    }

    fn enter(&mut self, mode: Mode) {
        self.state = SessionState::entering(mode, &self.settings, self.state.completed_focus_count);
    }

    fn complete(&mut self, skipped: bool) -> Event {
        let from = self.state.mode;
        let (count, credited_minutes) = match from {
            Mode::Focus => (
                self.state.completed_focus_count.saturating_add(1),
                Some(self.settings.focus),
            ),
            Mode::ShortBreak | Mode::LongBreak => (self.state.completed_focus_count, None),
        };
        let to = next_mode(from, count);
        self.state = SessionState::entering(to, &self.settings, count);
        tracing::debug!(%from, %to, count, skipped, "interval completed");
        Event::IntervalCompleted {
            from,
            to,
            credited_minutes,
            completed_focus_count: count,
            skipped,
            at: Utc::now(),
        }
    }
}
