//! # FocusFlow Core Library
//!
//! Business logic for the FocusFlow focus timer. The `focusflow` binary is a
//! thin terminal front end over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine over focus, short-break and
//!   long-break intervals; the caller invokes `tick()` once per second
//! - **Contributions**: focus minutes per calendar day, plus the display-only
//!   heatmap bucketing
//! - **Storage**: best-effort persistence over a SQLite key-value table and
//!   TOML configuration
//! - **Sync**: fire-and-forget mirror of settings and history to a remote
//!   script endpoint
//! - **Session / Countdown**: the controller that ties the above together and
//!   the one-second dispatcher loop that drives it
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`ContributionHistory`]: Focus minutes per day
//! - [`FocusSession`]: State owner and event dispatcher target
//! - [`Persistence`]: Load/save contract that never fails upward
//! - [`RemoteClient`]: Script endpoint client

pub mod contributions;
pub mod countdown;
pub mod error;
pub mod events;
pub mod format;
pub mod session;
pub mod storage;
pub mod sync;
pub mod timer;

pub use contributions::{record_focus, ContributionHistory, Heatmap, HeatmapCell};
pub use error::{ConfigError, StorageError, SyncError, ValidationError};
pub use events::Event;
pub use format::{format_time, format_title};
pub use session::{Clock, FixedClock, FocusSession, SystemClock};
pub use storage::{Config, Database, KeyValueStore, MemoryStore, Persistence};
pub use sync::{RemoteAction, RemoteClient};
pub use timer::{Mode, SessionState, TimerEngine, TimerSettings};
