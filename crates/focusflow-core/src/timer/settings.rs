use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Shortest accepted interval, in minutes.
pub const MIN_DURATION_MIN: u32 = 1;
/// Longest accepted interval, in minutes (one day).
pub const MAX_DURATION_MIN: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    /// Key used in storage and on the remote endpoint.
    pub fn key(self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }

    /// Human-readable label.
    pub fn title(self) -> &'static str {
        match self {
            Mode::Focus => "Focus",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    /// Accepts the storage keys as well as kebab/snake spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "focus" => Ok(Mode::Focus),
            "shortbreak" | "short" | "break" => Ok(Mode::ShortBreak),
            "longbreak" | "long" => Ok(Mode::LongBreak),
            _ => Err(ValidationError::UnknownMode(s.to_string())),
        }
    }
}

/// Interval lengths in minutes.
///
/// Serialized with the same camelCase keys the stored and remote copies use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    pub focus: u32,
    pub short_break: u32,
    pub long_break: u32,
}

impl TimerSettings {
    /// Build validated settings.
    pub fn new(focus: u32, short_break: u32, long_break: u32) -> Result<Self, ValidationError> {
        let settings = Self {
            focus,
            short_break,
            long_break,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Every duration must lie in `MIN_DURATION_MIN..=MAX_DURATION_MIN`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for mode in Mode::ALL {
            let value = self.minutes(mode);
            if !(MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&value) {
                return Err(ValidationError::DurationOutOfRange {
                    field: mode.key(),
                    value,
                    min: MIN_DURATION_MIN,
                    max: MAX_DURATION_MIN,
                });
            }
        }
        Ok(())
    }

    pub fn minutes(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Focus => self.focus,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        }
    }

    /// Full countdown length for `mode`, in seconds.
    pub fn duration_secs(&self, mode: Mode) -> u64 {
        u64::from(self.minutes(mode)) * 60
    }

    /// Copy with one duration replaced, validated as a whole.
    pub fn with_minutes(&self, mode: Mode, minutes: u32) -> Result<Self, ValidationError> {
        let mut next = *self;
        match mode {
            Mode::Focus => next.focus = minutes,
            Mode::ShortBreak => next.short_break = minutes,
            Mode::LongBreak => next.long_break = minutes,
        }
        next.validate()?;
        Ok(next)
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus: 25,
            short_break: 5,
            long_break: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_durations() {
        let s = TimerSettings::default();
        assert_eq!(s.duration_secs(Mode::Focus), 1500);
        assert_eq!(s.duration_secs(Mode::ShortBreak), 300);
        assert_eq!(s.duration_secs(Mode::LongBreak), 900);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let err = TimerSettings::new(25, 0, 15).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DurationOutOfRange {
                field: "shortBreak",
                value: 0,
                min: MIN_DURATION_MIN,
                max: MAX_DURATION_MIN,
            }
        );
    }

    #[test]
    fn oversized_duration_is_rejected() {
        assert!(TimerSettings::new(MAX_DURATION_MIN + 1, 5, 15).is_err());
        assert!(TimerSettings::new(MAX_DURATION_MIN, 5, 15).is_ok());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(TimerSettings::default()).unwrap();
        assert_eq!(json, serde_json::json!({"focus": 25, "shortBreak": 5, "longBreak": 15}));
    }

    #[test]
    fn mode_parses_common_spellings() {
        assert_eq!("focus".parse::<Mode>().unwrap(), Mode::Focus);
        assert_eq!("short-break".parse::<Mode>().unwrap(), Mode::ShortBreak);
        assert_eq!("shortBreak".parse::<Mode>().unwrap(), Mode::ShortBreak);
        assert_eq!("long_break".parse::<Mode>().unwrap(), Mode::LongBreak);
        assert!("nap".parse::<Mode>().is_err());
    }

    #[test]
    fn with_minutes_replaces_one_field() {
        let s = TimerSettings::default().with_minutes(Mode::LongBreak, 30).unwrap();
        assert_eq!(s.long_break, 30);
        assert_eq!(s.focus, 25);
        assert!(TimerSettings::default().with_minutes(Mode::Focus, 0).is_err());
    }
}
