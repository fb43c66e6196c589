//! Manual sync with the remote script endpoint.
//!
//! Remote history is append-only on the endpoint side, so only durations are
//! ever pushed wholesale; completed focus minutes go out as they happen.

use clap::Subcommand;
use focusflow_core::{Config, Mode, SyncError};

use super::{open_session, print_json, remote_client, runtime, CmdResult};

#[derive(Subcommand)]
pub enum SyncAction {
    /// Fetch durations and history from the endpoint, replacing local copies
    Pull,
    /// Send the local durations to the endpoint
    Push,
}

pub fn run(action: SyncAction, config: &Config) -> CmdResult {
    let remote = remote_client(config).ok_or(SyncError::Disabled)?;
    let mut session = open_session()?.with_remote(remote.clone());
    let rt = runtime()?;

    match action {
        SyncAction::Pull => {
            let (events, errors) = rt.block_on(session.pull_remote())?;
            for event in &events {
                print_json(event)?;
            }
            for error in &errors {
                eprintln!("warning: {error}");
            }
            if errors.len() == 2 {
                return Err("remote endpoint unreachable; local state kept".into());
            }
            println!(
                "history: {} days, {} min",
                session.history().active_days(),
                session.history().total_minutes()
            );
        }
        SyncAction::Push => {
            let settings = *session.settings();
            rt.block_on(async {
                for mode in Mode::ALL {
                    remote.update_duration(mode, settings.minutes(mode)).await?;
                }
                Ok::<_, SyncError>(())
            })?;
            println!("pushed durations to {}", remote.endpoint().host_str().unwrap_or("remote"));
        }
    }
    Ok(())
}
