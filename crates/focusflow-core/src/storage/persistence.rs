//! Typed, best-effort persistence of timer state.
//!
//! Reads fall back to defaults and writes swallow errors; both log through
//! `tracing`. Nothing here returns an error to the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::KeyValueStore;
use crate::contributions::ContributionHistory;
use crate::timer::{SessionState, TimerSettings};

pub const KEY_SETTINGS: &str = "pomodoroSettings";
pub const KEY_CONTRIBUTIONS: &str = "pomodoroContributions";
pub const KEY_CYCLE: &str = "pomodoroCycle";
pub const KEY_SESSION: &str = "pomodoroSession";

/// Persistence adapter over any [`KeyValueStore`].
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read and decode `key`. `None` when absent or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unparsable stored value");
                None
            }
        }
    }

    /// Encode and write `value` under `key`. Returns whether it was stored.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to encode value");
                return false;
            }
        };
        match self.store.set(key, &raw) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to write value");
                false
            }
        }
    }

    /// Stored settings, or defaults when absent or out of range.
    pub fn load_settings(&self) -> TimerSettings {
        match self.load::<TimerSettings>(KEY_SETTINGS) {
            Some(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring stored settings");
                    TimerSettings::default()
                }
            },
            None => TimerSettings::default(),
        }
    }

    pub fn save_settings(&self, settings: &TimerSettings) -> bool {
        self.save(KEY_SETTINGS, settings)
    }

    pub fn load_history(&self) -> ContributionHistory {
        self.load(KEY_CONTRIBUTIONS).unwrap_or_default()
    }

    pub fn save_history(&self, history: &ContributionHistory) -> bool {
        self.save(KEY_CONTRIBUTIONS, history)
    }

    pub fn load_cycle(&self) -> u64 {
        self.load(KEY_CYCLE).unwrap_or(0)
    }

    pub fn save_cycle(&self, completed_focus_count: u64) -> bool {
        self.save(KEY_CYCLE, &completed_focus_count)
    }

    /// Last saved countdown position, if any.
    pub fn load_session(&self) -> Option<SessionState> {
        self.load(KEY_SESSION)
    }

    pub fn save_session(&self, state: &SessionState) -> bool {
        self.save(KEY_SESSION, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;
    use crate::timer::Mode;
    use chrono::NaiveDate;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Locked)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    #[test]
    fn defaults_when_empty() {
        let p = Persistence::new(MemoryStore::new());
        assert_eq!(p.load_settings(), TimerSettings::default());
        assert!(p.load_history().is_empty());
        assert_eq!(p.load_cycle(), 0);
        assert!(p.load_session().is_none());
    }

    #[test]
    fn roundtrips_each_key_independently() {
        let p = Persistence::new(MemoryStore::new());
        let settings = TimerSettings::new(50, 10, 30).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = ContributionHistory::new().with_focus(day, 50);

        assert!(p.save_settings(&settings));
        assert!(p.save_history(&history));
        assert!(p.save_cycle(7));

        assert_eq!(p.load_settings(), settings);
        assert_eq!(p.load_history(), history);
        assert_eq!(p.load_cycle(), 7);
    }

    #[test]
    fn stored_format_matches_keys() {
        let p = Persistence::new(MemoryStore::new());
        p.save_settings(&TimerSettings::default());
        let raw = p.store().get(KEY_SETTINGS).unwrap().unwrap();
        assert_eq!(raw, r#"{"focus":25,"shortBreak":5,"longBreak":15}"#);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set(KEY_SETTINGS, "{not json").unwrap();
        store.set(KEY_CONTRIBUTIONS, "[1,2,3]").unwrap();
        store.set(KEY_CYCLE, "\"four\"").unwrap();
        let p = Persistence::new(store);
        assert_eq!(p.load_settings(), TimerSettings::default());
        assert!(p.load_history().is_empty());
        assert_eq!(p.load_cycle(), 0);
    }

    #[test]
    fn out_of_range_settings_fall_back_to_default() {
        let store = MemoryStore::new();
        store
            .set(KEY_SETTINGS, r#"{"focus":0,"shortBreak":5,"longBreak":15}"#)
            .unwrap();
        let p = Persistence::new(store);
        assert_eq!(p.load_settings(), TimerSettings::default());
    }

    #[test]
    fn broken_store_never_errors() {
        let p = Persistence::new(BrokenStore);
        assert_eq!(p.load_settings(), TimerSettings::default());
        assert_eq!(p.load_cycle(), 0);
        assert!(!p.save_cycle(1));
        assert!(!p.save_session(&SessionState::entering(
            Mode::Focus,
            &TimerSettings::default(),
            0
        )));
    }
}
