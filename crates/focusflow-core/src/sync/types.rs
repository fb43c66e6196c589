//! Remote endpoint actions and response decoding.

use chrono::NaiveDate;
use serde_json::Value;

use crate::contributions::{day_key, ContributionHistory};
use crate::error::SyncError;
use crate::timer::{Mode, TimerSettings};

/// One query-parameter driven call against the script endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAction {
    GetAllDurations,
    GetHistory,
    UpdateDuration { mode: Mode, minutes: u32 },
    IncrementHistory { day: NaiveDate, minutes: u32 },
}

impl RemoteAction {
    /// Value of the `action` query parameter.
    pub fn name(&self) -> &'static str {
        match self {
            RemoteAction::GetAllDurations => "getAllDurations",
            RemoteAction::GetHistory => "getHistory",
            RemoteAction::UpdateDuration { .. } => "updateDuration",
            RemoteAction::IncrementHistory { .. } => "incrementHistory",
        }
    }

    /// Full query string parameters, `action` first.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("action", self.name().to_string())];
        match self {
            RemoteAction::GetAllDurations | RemoteAction::GetHistory => {}
            RemoteAction::UpdateDuration { mode, minutes } => {
                params.push(("key", mode.key().to_string()));
                params.push(("value", minutes.to_string()));
            }
            RemoteAction::IncrementHistory { day, minutes } => {
                params.push(("key", day_key(*day)));
                params.push(("value", minutes.to_string()));
            }
        }
        params
    }
}

/// Whole non-negative number from a JSON number or numeric string.
fn as_minutes(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|m| u32::try_from(m).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode a `getAllDurations` response.
///
/// All three durations must be present and in range; anything less is
/// rejected so local settings are never half-overwritten.
pub fn parse_settings(body: &Value) -> Result<TimerSettings, SyncError> {
    let malformed = |message: String| SyncError::MalformedResponse {
        action: RemoteAction::GetAllDurations.name().to_string(),
        message,
    };
    let obj = body
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object".into()))?;

    let field = |mode: Mode| {
        obj.get(mode.key())
            .and_then(as_minutes)
            .ok_or_else(|| malformed(format!("missing or invalid '{}'", mode.key())))
    };
    let settings = TimerSettings {
        focus: field(Mode::Focus)?,
        short_break: field(Mode::ShortBreak)?,
        long_break: field(Mode::LongBreak)?,
    };
    settings.validate().map_err(|e| malformed(e.to_string()))?;
    Ok(settings)
}

/// Decode a `getHistory` response.
///
/// Entries whose key is not a `yyyy-MM-dd` date or whose value is not a
/// whole number of minutes are dropped.
pub fn parse_history(body: &Value) -> Result<ContributionHistory, SyncError> {
    let obj = body.as_object().ok_or_else(|| SyncError::MalformedResponse {
        action: RemoteAction::GetHistory.name().to_string(),
        message: "expected a JSON object".into(),
    })?;

    Ok(obj
        .iter()
        .filter_map(|(key, value)| {
            let day = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok();
            let minutes = as_minutes(value);
            if day.is_none() || minutes.is_none() {
                tracing::debug!(key = %key, %value, "skipping remote history entry");
            }
            Some((day?, minutes?))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_for_each_action() {
        assert_eq!(
            RemoteAction::GetAllDurations.query(),
            vec![("action", "getAllDurations".to_string())]
        );
        assert_eq!(
            RemoteAction::UpdateDuration { mode: Mode::ShortBreak, minutes: 7 }.query(),
            vec![
                ("action", "updateDuration".to_string()),
                ("key", "shortBreak".to_string()),
                ("value", "7".to_string()),
            ]
        );
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            RemoteAction::IncrementHistory { day, minutes: 25 }.query(),
            vec![
                ("action", "incrementHistory".to_string()),
                ("key", "2024-01-01".to_string()),
                ("value", "25".to_string()),
            ]
        );
    }

    #[test]
    fn settings_accept_numbers_and_numeric_strings() {
        let settings = parse_settings(&json!({"focus": 30, "shortBreak": "6", "longBreak": 20.0})).unwrap();
        assert_eq!(settings, TimerSettings::new(30, 6, 20).unwrap());
    }

    #[test]
    fn settings_with_missing_field_are_rejected() {
        let err = parse_settings(&json!({"focus": 30, "shortBreak": 6})).unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse { .. }));
    }

    #[test]
    fn settings_out_of_range_are_rejected() {
        assert!(parse_settings(&json!({"focus": 0, "shortBreak": 5, "longBreak": 15})).is_err());
        assert!(parse_settings(&json!({"focus": -5, "shortBreak": 5, "longBreak": 15})).is_err());
        assert!(parse_settings(&json!([25, 5, 15])).is_err());
    }

    #[test]
    fn history_drops_bad_entries() {
        let history = parse_history(&json!({
            "2024-01-01": 50,
            "2024-01-02": "25",
            "yesterday": 10,
            "2024-01-03": "lots",
            "2024-01-04": -3,
        }))
        .unwrap();
        let d = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(history.minutes_on(d("2024-01-01")), 50);
        assert_eq!(history.minutes_on(d("2024-01-02")), 25);
        assert_eq!(history.active_days(), 2);
    }

    #[test]
    fn history_must_be_an_object() {
        assert!(parse_history(&json!("nope")).is_err());
        assert!(parse_history(&json!({})).unwrap().is_empty());
    }
}
