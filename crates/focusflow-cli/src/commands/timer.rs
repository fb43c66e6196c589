use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::Subcommand;
use focusflow_core::countdown::{self, Command, Exit, RunOptions};
use focusflow_core::storage::Database;
use focusflow_core::{format_title, Config, Event, FocusSession, Mode, RemoteAction};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{mirror, open_session, print_json, remote_client, runtime, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON
    Status,
    /// Run the countdown in the foreground (p: pause/resume, r: reset, s: skip, q: quit)
    Run {
        /// Exit when the current interval completes
        #[arg(long)]
        once: bool,
    },
    /// Stop and restore the full duration of the current mode
    Reset,
    /// Complete the current interval now, crediting it in full
    Skip {
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Switch to another mode (focus, short-break, long-break)
    Mode { mode: Mode },
}

pub fn run(action: TimerAction, config: &Config) -> CmdResult {
    if let TimerAction::Run { once } = action {
        return run_foreground(config, once);
    }

    let mut session = open_session()?;
    match action {
        TimerAction::Status => print_json(&session.snapshot())?,
        TimerAction::Reset => print_json(&session.reset())?,
        TimerAction::Mode { mode } => print_json(&session.switch_mode(mode))?,
        TimerAction::Skip { yes } => {
            let confirmed = yes || confirm_skip(session.state().mode)?;
            let events = session.skip(confirmed);
            if events.is_empty() {
                eprintln!("skip cancelled");
                return Ok(());
            }
            for event in &events {
                print_json(event)?;
            }
            mirror(config, contribution_pushes(&events))?;
        }
        TimerAction::Run { .. } => {}
    }
    Ok(())
}

fn confirm_skip(mode: Mode) -> std::io::Result<bool> {
    eprint!("Skip the current {} interval? [y/N] ", mode.title());
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn contribution_pushes(events: &[Event]) -> Vec<RemoteAction> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::ContributionRecorded { day, minutes, .. } => Some(RemoteAction::IncrementHistory {
                day: *day,
                minutes: *minutes,
            }),
            _ => None,
        })
        .collect()
}

/// Map one line of keyboard input to a command. Skip confirmation is asked separately.
fn parse_key(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "" => Some(Command::Toggle),
        "r" => Some(Command::Reset),
        "s" => Some(Command::Skip { confirmed: false }),
        "q" => Some(Command::Quit),
        "f" => Some(Command::SwitchMode(Mode::Focus)),
        "b" => Some(Command::SwitchMode(Mode::ShortBreak)),
        "l" => Some(Command::SwitchMode(Mode::LongBreak)),
        _ => None,
    }
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let command = match parse_key(&line) {
            Some(Command::Skip { .. }) => {
                eprint!("Skip the current interval? [y/N] ");
                let answer = lines.next_line().await.ok().flatten().unwrap_or_default();
                Command::Skip {
                    confirmed: is_yes(&answer),
                }
            }
            Some(command) => command,
            None => {
                eprintln!("keys: p pause/resume, r reset, s skip, f/b/l mode, q quit");
                continue;
            }
        };
        if tx.send(command).await.is_err() {
            break;
        }
    }
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn render(session: &FocusSession<Database>, events: &[Event], bell: bool) {
    let mut out = std::io::stdout();
    for event in events {
        match event {
            Event::IntervalCompleted { from, to, skipped, .. } => {
                let how = if *skipped { "skipped" } else { "complete" };
                let ring = if bell { "\x07" } else { "" };
                let _ = writeln!(out, "\r{ring}{} {how}. Next up: {}", from.title(), to.title());
            }
            Event::ContributionRecorded { minutes, day_total, .. } => {
                let _ = writeln!(out, "+{minutes} min ({day_total} min today)");
            }
            Event::SettingsChanged { settings, .. } => {
                let _ = writeln!(
                    out,
                    "\rdurations updated: {}/{}/{} min",
                    settings.focus, settings.short_break, settings.long_break
                );
            }
            _ => {}
        }
    }

    let state = session.state();
    let title = format_title(state.mode, state.seconds_remaining);
    if out.is_terminal() {
        let _ = write!(out, "\x1b]0;{title}\x1b\\");
    }
    let paused = if state.is_active { "" } else { " (paused)" };
    let _ = write!(out, "\r{title}{paused}    ");
    let _ = out.flush();
}

fn run_foreground(config: &Config, once: bool) -> CmdResult {
    let bell = config.notifications.bell;
    let remote = remote_client(config);
    let flush_timeout = Duration::from_secs(config.remote.timeout_secs.max(1));

    // The stdin reader holds a blocking thread, so the runtime is not waited on.
    let rt = runtime()?;
    let result = rt.block_on(async move {
        let mut session = open_session()?;
        if let Some(remote) = remote.clone() {
            session = session.with_remote(remote);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (remote_tx, remote_rx) = mpsc::channel(2);
        match remote {
            Some(remote) => {
                countdown::spawn_pull(remote, remote_tx);
            }
            None => drop(remote_tx),
        }
        tokio::spawn(read_commands(cmd_tx));

        session.start();
        render(&session, &[], bell);

        let exit = countdown::run(
            &mut session,
            cmd_rx,
            remote_rx,
            ctrl_c(),
            RunOptions {
                exit_on_completion: once,
            },
            |session, events| render(session, events, bell),
        )
        .await;

        println!();
        tracing::debug!(?exit, "countdown stopped");
        if exit == Exit::Shutdown {
            eprintln!("interrupted; timer paused");
        }
        // Increments spawned by the last completion must land before the runtime is dropped.
        session.flush_remote(flush_timeout).await;
        Ok::<_, Box<dyn std::error::Error>>(())
    });
    rt.shutdown_background();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(parse_key("p"), Some(Command::Toggle));
        assert_eq!(parse_key(" R \n"), Some(Command::Reset));
        assert_eq!(parse_key("s"), Some(Command::Skip { confirmed: false }));
        assert_eq!(parse_key("q"), Some(Command::Quit));
        assert_eq!(parse_key("l"), Some(Command::SwitchMode(Mode::LongBreak)));
        assert_eq!(parse_key("x"), None);
    }

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes("YES"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
    }

    #[test]
    fn contributions_become_increment_pushes() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let events = vec![
            Event::ModeChanged {
                mode: Mode::Focus,
                seconds_remaining: 1500,
                at: Utc::now(),
            },
            Event::ContributionRecorded {
                day,
                minutes: 25,
                day_total: 50,
                at: Utc::now(),
            },
        ];
        assert_eq!(
            contribution_pushes(&events),
            vec![RemoteAction::IncrementHistory { day, minutes: 25 }]
        );
    }
}
