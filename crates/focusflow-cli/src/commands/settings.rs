use clap::Subcommand;
use focusflow_core::{Config, Mode, RemoteAction, TimerSettings};

use super::{mirror, open_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print interval durations (minutes) as JSON
    Show,
    /// Change one or more interval durations, in minutes
    Set {
        #[arg(long)]
        focus: Option<u32>,
        #[arg(long)]
        short_break: Option<u32>,
        #[arg(long)]
        long_break: Option<u32>,
    },
}

pub fn run(action: SettingsAction, config: &Config) -> CmdResult {
    let mut session = open_session()?;
    match action {
        SettingsAction::Show => print_json(session.settings())?,
        SettingsAction::Set {
            focus,
            short_break,
            long_break,
        } => {
            let current = *session.settings();
            let updated = edit(current, [focus, short_break, long_break])?;
            if updated == current {
                println!("durations unchanged");
                return Ok(());
            }
            let event = session.apply_settings(updated)?;
            print_json(&event)?;
            mirror(config, duration_pushes(&updated))?;
        }
    }
    Ok(())
}

/// Apply optional per-mode edits (in `Mode::ALL` order) on top of `current`.
fn edit(current: TimerSettings, edits: [Option<u32>; 3]) -> Result<TimerSettings, Box<dyn std::error::Error>> {
    if edits.iter().all(Option::is_none) {
        return Err("nothing to change; pass --focus, --short-break or --long-break".into());
    }
    let mut settings = current;
    for (mode, minutes) in Mode::ALL.into_iter().zip(edits) {
        if let Some(minutes) = minutes {
            settings = settings.with_minutes(mode, minutes)?;
        }
    }
    Ok(settings)
}

fn duration_pushes(settings: &TimerSettings) -> Vec<RemoteAction> {
    Mode::ALL
        .into_iter()
        .map(|mode| RemoteAction::UpdateDuration {
            mode,
            minutes: settings.minutes(mode),
        })
        .collect()
}
