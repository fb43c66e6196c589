//! Countdown display formatting.

use crate::timer::Mode;

/// Application name shown in titles.
pub const APP_NAME: &str = "FocusFlow";

/// Format a second count as `MM:SS`.
///
/// Both fields are zero-padded to two digits. Minutes do not roll over into
/// hours, so `3600` renders as `60:00`.
pub fn format_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Title line for the current countdown, e.g. `24:59 - Focus | FocusFlow`.
pub fn format_title(mode: Mode, seconds: u64) -> String {
    format!("{} - {} | {APP_NAME}", format_time(seconds), mode.title())
}
