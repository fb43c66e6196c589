pub mod config;
pub mod history;
pub mod settings;
pub mod sync;
pub mod timer;

use focusflow_core::{
    Config, Database, FocusSession, Persistence, RemoteAction, RemoteClient, StorageError,
    SyncError,
};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the on-disk store, falling back to a throwaway one so the timer still works.
pub fn open_session() -> Result<FocusSession<Database>, StorageError> {
    let db = Database::open().or_else(|e| {
        tracing::warn!(error = %e, "database unavailable; state will not be saved");
        Database::open_memory()
    })?;
    Ok(FocusSession::load(Persistence::new(db)))
}

/// Remote client from configuration; `None` when sync is off or misconfigured.
pub fn remote_client(config: &Config) -> Option<RemoteClient> {
    match RemoteClient::from_config(&config.remote) {
        Ok(client) => Some(client),
        Err(SyncError::Disabled) => None,
        Err(e) => {
            tracing::warn!(error = %e, "remote sync misconfigured");
            None
        }
    }
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Send `actions` in order and wait for each. Failures are logged only.
pub fn mirror(config: &Config, actions: Vec<RemoteAction>) -> CmdResult {
    let Some(remote) = remote_client(config) else {
        return Ok(());
    };
    if actions.is_empty() {
        return Ok(());
    }
    runtime()?.block_on(async {
        for action in &actions {
            if let Err(e) = remote.execute(action).await {
                tracing::warn!(action = action.name(), error = %e, "remote update failed");
            }
        }
    });
    Ok(())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
