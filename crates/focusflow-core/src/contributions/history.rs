use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Accumulated focus minutes keyed by local calendar day.
///
/// Days without focus time have no entry. Serialized as a flat JSON object
/// keyed by `yyyy-MM-dd`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionHistory {
    days: BTreeMap<NaiveDate, u32>,
}

impl ContributionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minutes credited to `day`; zero when absent.
    pub fn minutes_on(&self, day: NaiveDate) -> u32 {
        self.days.get(&day).copied().unwrap_or(0)
    }

    /// Copy of this history with `minutes` added to `day`.
    ///
    /// Adding zero minutes returns an unchanged copy, so no zero entries are
    /// ever created.
    pub fn with_focus(&self, day: NaiveDate, minutes: u32) -> Self {
        let mut days = self.days.clone();
        if minutes > 0 {
            let total = days.entry(day).or_insert(0);
            *total = total.saturating_add(minutes);
        }
        Self { days }
    }

    pub fn total_minutes(&self) -> u64 {
        self.days.values().map(|&m| u64::from(m)).sum()
    }

    /// Number of days with any focus time.
    pub fn active_days(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.days.iter().map(|(&day, &minutes)| (day, minutes))
    }
}

impl FromIterator<(NaiveDate, u32)> for ContributionHistory {
    /// Entries for the same day are summed; zero entries are dropped.
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u32)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |history, (day, minutes)| history.with_focus(day, minutes))
    }
}

/// Credit a completed focus interval to `day`.
pub fn record_focus(history: &ContributionHistory, day: NaiveDate, minutes: u32) -> ContributionHistory {
    history.with_focus(day, minutes)
}

/// Storage/remote key for a day, `yyyy-MM-dd`.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
