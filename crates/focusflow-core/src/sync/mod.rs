//! Best-effort mirror of settings and history on a remote script endpoint.

pub mod client;
pub mod types;


pub use client::RemoteClient;
pub use types::{parse_history, parse_settings, RemoteAction};
