mod engine;
mod settings;

pub use engine::{next_mode, SessionState, TimerEngine, FOCUS_SESSIONS_PER_CYCLE};
pub use settings::{Mode, TimerSettings, MAX_DURATION_MIN, MIN_DURATION_MIN};
