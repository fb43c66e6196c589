//! Session controller.
//!
//! [`FocusSession`] owns the authoritative in-memory state (timer engine and
//! contribution history) and is the only place that talks to persistence and
//! the remote endpoint. Each operation runs a transition on the engine, then
//! flushes whatever that transition changed:
//!
//! | operation          | local writes                 | remote push               |
//! |--------------------|------------------------------|---------------------------|
//! | focus completion   | history, cycle, session      | `incrementHistory`        |
//! | break completion   | session                      | none                      |
//! | settings change    | settings, session            | `updateDuration` per mode |
//! | toggle/reset/mode  | session                      | none                      |

use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use tokio::task::JoinHandle;

use crate::contributions::{record_focus, ContributionHistory};
use crate::error::{SyncError, ValidationError};
use crate::events::Event;
use crate::storage::{KeyValueStore, Persistence};
use crate::sync::{RemoteAction, RemoteClient};
use crate::timer::{Mode, SessionState, TimerEngine, TimerSettings};

/// Source of "today" for contribution keys.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar day from the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always the same day. Useful in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub struct FocusSession<S> {
    engine: TimerEngine,
    history: ContributionHistory,
    persistence: Persistence<S>,
    remote: Option<RemoteClient>,
    /// Pushes spawned but not yet known to be finished.
    pending: Vec<JoinHandle<()>>,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> FocusSession<S> {
    /// Restore a session from storage.
    ///
    /// Each key is read independently and falls back to its default. A saved
    /// countdown position is resumed (stopped) when present.
    pub fn load(persistence: Persistence<S>) -> Self {
        let settings = persistence.load_settings();
        let history = persistence.load_history();
        let cycle = persistence.load_cycle();
        let engine = match persistence.load_session() {
            Some(state) => TimerEngine::restore(
                settings,
                SessionState {
                    completed_focus_count: cycle,
                    ..state
                },
            ),
            None => TimerEngine::with_count(settings, cycle),
        };
        tracing::debug!(mode = %engine.mode(), cycle, "session loaded");
        Self {
            engine,
            history,
            persistence,
            remote: None,
            pending: Vec::new(),
            clock: Box::new(SystemClock),
        }
    }

    /// Mirror completions and settings to `remote`.
    pub fn with_remote(mut self, remote: RemoteClient) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn state(&self) -> &SessionState {
        self.engine.state()
    }

    pub fn settings(&self) -> &TimerSettings {
        self.engine.settings()
    }

    pub fn history(&self) -> &ContributionHistory {
        &self.history
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn remote(&self) -> Option<&RemoteClient> {
        self.remote.as_ref()
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    // ── User operations ──────────────────────────────────────────────

    pub fn toggle(&mut self) -> Event {
        let event = self.engine.toggle();
        self.save_session();
        event
    }

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start()?;
        self.save_session();
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause()?;
        self.save_session();
        Some(event)
    }

    pub fn reset(&mut self) -> Event {
        let event = self.engine.reset();
        self.save_session();
        event
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Event {
        let event = self.engine.switch_mode(mode);
        self.save_session();
        event
    }

    /// Validate and apply user-edited settings, then save and mirror them.
    pub fn apply_settings(&mut self, settings: TimerSettings) -> Result<Event, ValidationError> {
        let event = self.engine.apply_settings(settings)?;
        self.persistence.save_settings(&settings);
        self.save_session();
        self.push_settings();
        Ok(event)
    }

    /// Skip to the next interval. Nothing happens unless `confirmed`.
    pub fn skip(&mut self, confirmed: bool) -> Vec<Event> {
        match self.engine.skip(confirmed) {
            Some(event) => self.after_completion(event),
            None => Vec::new(),
        }
    }

    /// One countdown second. Returns the completion events, if any.
    pub fn tick(&mut self) -> Vec<Event> {
        match self.engine.tick() {
            Some(event) => self.after_completion(event),
            None => Vec::new(),
        }
    }

    // ── Remote ───────────────────────────────────────────────────────

    /// Replace settings with a remote copy. Last write wins.
    ///
    /// Stored locally but not pushed back. Returns `None` when the copy is
    /// identical or invalid.
    pub fn accept_remote_settings(&mut self, settings: TimerSettings) -> Option<Event> {
        if settings == *self.engine.settings() {
            return None;
        }
        match self.engine.apply_settings(settings) {
            Ok(event) => {
                self.persistence.save_settings(&settings);
                self.save_session();
                Some(event)
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring remote settings");
                None
            }
        }
    }

    /// Replace the whole history with a remote copy. Last write wins.
    pub fn accept_remote_history(&mut self, history: ContributionHistory) -> bool {
        if history == self.history {
            return false;
        }
        self.history = history;
        self.persistence.save_history(&self.history);
        true
    }

    /// Fetch settings and history and apply whatever arrived.
    ///
    /// Each fetch fails independently; failures are logged and returned
    /// alongside the events from whatever succeeded.
    pub async fn pull_remote(&mut self) -> Result<(Vec<Event>, Vec<SyncError>), SyncError> {
        let remote = self.remote.clone().ok_or(SyncError::Disabled)?;
        let (settings, history) = tokio::join!(remote.fetch_settings(), remote.fetch_history());

        let mut events = Vec::new();
        let mut errors = Vec::new();
        match settings {
            Ok(settings) => events.extend(self.accept_remote_settings(settings)),
            Err(e) => {
                tracing::warn!(error = %e, "remote settings unavailable");
                errors.push(e);
            }
        }
        match history {
            Ok(history) => {
                self.accept_remote_history(history);
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote history unavailable");
                errors.push(e);
            }
        }
        Ok((events, errors))
    }

    /// Send every configured duration to the remote side.
    pub fn push_settings(&mut self) {
        let settings = *self.engine.settings();
        for mode in Mode::ALL {
            self.push(RemoteAction::UpdateDuration {
                mode,
                minutes: settings.minutes(mode),
            });
        }
    }

    /// Wait up to `timeout` for pushes still in flight.
    ///
    /// Must be awaited before the runtime goes away, or history increments
    /// spawned just before exit are lost. Returns how many were abandoned.
    pub async fn flush_remote(&mut self, timeout: Duration) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let total = pending.len();
        let mut finished = 0;
        let wait = async {
            for handle in pending {
                let _ = handle.await;
                finished += 1;
            }
        };
        let _ = tokio::time::timeout(timeout, wait).await;
        let abandoned = total - finished;
        if abandoned > 0 {
            tracing::warn!(abandoned, "remote pushes still pending at exit");
        }
        abandoned
    }

    /// Number of spawned pushes not yet flushed.
    pub fn pending_pushes(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn push(&mut self, action: RemoteAction) {
        let Some(remote) = &self.remote else {
            return;
        };
        self.pending.retain(|h| !h.is_finished());
        self.pending.extend(remote.push(action));
    }

    fn save_session(&self) {
        self.persistence.save_session(self.engine.state());
    }

    fn after_completion(&mut self, event: Event) -> Vec<Event> {
        let mut events = vec![event];
        if let Some(Event::IntervalCompleted {
            credited_minutes: Some(minutes),
            completed_focus_count,
            ..
        }) = events.first().cloned()
        {
            let day = self.clock.today();
            self.history = record_focus(&self.history, day, minutes);
            self.persistence.save_history(&self.history);
            self.persistence.save_cycle(completed_focus_count);
            self.push(RemoteAction::IncrementHistory { day, minutes });
            events.push(Event::ContributionRecorded {
                day,
                minutes,
                day_total: self.history.minutes_on(day),
                at: Utc::now(),
            });
        }
        self.save_session();
        events
    }
}
