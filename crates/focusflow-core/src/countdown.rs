//! The repeating one-second countdown and its event dispatcher.
//!
//! [`run`] multiplexes the tick, user commands, remote responses, and a
//! shutdown signal with `tokio::select!`. Each trigger is handled to
//! completion before the next one is polled. The interval only exists while
//! the session is active; any transition that stops the countdown drops it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::contributions::ContributionHistory;
use crate::events::Event;
use crate::session::FocusSession;
use crate::storage::KeyValueStore;
use crate::sync::RemoteClient;
use crate::timer::{Mode, TimerSettings};

/// Tick period.
pub const TICK: Duration = Duration::from_secs(1);

/// User input delivered to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Reset,
    /// Skip the current interval; ignored unless `confirmed`.
    Skip { confirmed: bool },
    SwitchMode(Mode),
    Quit,
}

/// A late-arriving remote copy. Applied whole, last write wins.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteUpdate {
    Settings(TimerSettings),
    History(ContributionHistory),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Return as soon as an interval completes.
    pub exit_on_completion: bool,
}

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// An interval completed and `exit_on_completion` was set.
    Completed,
    /// The user sent [`Command::Quit`].
    Quit,
    /// The command channel closed while the countdown was stopped.
    Idle,
    /// The shutdown future resolved.
    Shutdown,
}

fn new_ticker() -> Interval {
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Fetch remote settings and history in the background.
///
/// Each result is forwarded to `tx` as it arrives; failures are logged and
/// dropped, leaving local state in charge.
pub fn spawn_pull(remote: RemoteClient, tx: mpsc::Sender<RemoteUpdate>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let settings_tx = tx.clone();
        let settings = async {
            match remote.fetch_settings().await {
                Ok(s) => {
                    if settings_tx.send(RemoteUpdate::Settings(s)).await.is_err() {
                        tracing::debug!("countdown stopped; remote settings dropped");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "remote settings unavailable"),
            }
        };
        let history = async {
            match remote.fetch_history().await {
                Ok(h) => {
                    if tx.send(RemoteUpdate::History(h)).await.is_err() {
                        tracing::debug!("countdown stopped; remote history dropped");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "remote history unavailable"),
            }
        };
        tokio::join!(settings, history);
    })
}

/// Drive `session` until one of the [`Exit`] conditions holds.
///
/// `on_update` is called after every handled trigger (including plain ticks)
/// with the events it produced, so the caller can redraw. On shutdown the
/// countdown is paused, which also persists its position.
pub async fn run<S, F, Fut>(
    session: &mut FocusSession<S>,
    mut commands: mpsc::Receiver<Command>,
    mut remote_updates: mpsc::Receiver<RemoteUpdate>,
    shutdown: Fut,
    options: RunOptions,
    mut on_update: F,
) -> Exit
where
    S: KeyValueStore,
    F: FnMut(&FocusSession<S>, &[Event]),
    Fut: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = session.is_active().then(new_ticker);
    let mut commands_open = true;
    let mut remote_open = true;

    loop {
        let mut events = Vec::new();
        let mut exit = None;

        tokio::select! {
            _ = &mut shutdown => {
                events.extend(session.pause());
                exit = Some(Exit::Shutdown);
            }
            _ = next_tick(&mut ticker), if ticker.is_some() => {
                events = session.tick();
            }
            cmd = commands.recv(), if commands_open => match cmd {
                Some(Command::Toggle) => events.push(session.toggle()),
                Some(Command::Reset) => events.push(session.reset()),
                Some(Command::Skip { confirmed }) => events = session.skip(confirmed),
                Some(Command::SwitchMode(mode)) => events.push(session.switch_mode(mode)),
                Some(Command::Quit) => {
                    events.extend(session.pause());
                    exit = Some(Exit::Quit);
                }
                None => commands_open = false,
            },
            update = remote_updates.recv(), if remote_open => match update {
                Some(RemoteUpdate::Settings(settings)) => {
                    events.extend(session.accept_remote_settings(settings));
                }
                Some(RemoteUpdate::History(history)) => {
                    session.accept_remote_history(history);
                }
                None => remote_open = false,
            },
        }

        let completed = events
            .iter()
            .any(|e| matches!(e, Event::IntervalCompleted { .. }));
        on_update(session, &events);

        if let Some(exit) = exit {
            return exit;
        }
        if completed && options.exit_on_completion {
            return Exit::Completed;
        }
        if !commands_open && !session.is_active() {
            return Exit::Idle;
        }

        match (session.is_active(), ticker.is_some()) {
            (true, false) => ticker = Some(new_ticker()),
            (false, true) => ticker = None,
            _ => {}
        }
    }
}
