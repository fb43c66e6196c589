//! Display-only bucketing of contributions into a week grid.
//!
//! Levels and thresholds are a presentation concern; nothing here is stored.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::history::ContributionHistory;

/// How far back the grid reaches.
pub const HEATMAP_MONTHS: u32 = 6;

/// Upper bounds (exclusive) of levels 1, 2 and 3, in minutes.
const LEVEL_THRESHOLDS: [u32; 3] = [25, 60, 120];

/// Intensity level 0..=4 for a day's minutes.
pub fn contribution_level(minutes: u32) -> u8 {
    if minutes == 0 {
        return 0;
    }
    LEVEL_THRESHOLDS
        .iter()
        .position(|&limit| minutes < limit)
        .map(|i| i as u8 + 1)
        .unwrap_or(4)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub day: NaiveDate,
    pub minutes: u32,
    /// `None` for days after today.
    pub level: Option<u8>,
}

impl HeatmapCell {
    pub fn is_future(&self) -> bool {
        self.level.is_none()
    }

    /// Hover text, e.g. `50 minutes on Monday, January 1, 2024`.
    pub fn describe(&self) -> String {
        let when = self.day.format("%A, %B %-d, %Y");
        if self.minutes > 0 {
            format!("{} minutes on {when}", self.minutes)
        } else {
            format!("No contributions on {when}")
        }
    }
}

/// Weeks (Monday first) from six months before `today` through the end of
/// the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub weeks: Vec<Vec<HeatmapCell>>,
}

impl Heatmap {
    pub fn build(history: &ContributionHistory, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_months(Months::new(HEATMAP_MONTHS))
            .unwrap_or(today);
        let first = start - Duration::days(i64::from(start.weekday().num_days_from_monday()));
        let last = today + Duration::days(6 - i64::from(today.weekday().num_days_from_monday()));

        let mut weeks = Vec::new();
        let mut week = Vec::with_capacity(7);
        for day in first.iter_days().take_while(|d| *d <= last) {
            let minutes = history.minutes_on(day);
            let level = (day <= today).then(|| contribution_level(minutes));
            week.push(HeatmapCell { day, minutes, level });
            if week.len() == 7 {
                weeks.push(std::mem::replace(&mut week, Vec::with_capacity(7)));
            }
        }
        Self { weeks }
    }

    /// Cells for one weekday across all weeks (0 = Monday).
    pub fn row(&self, weekday: usize) -> impl Iterator<Item = &HeatmapCell> + '_ {
        self.weeks.iter().filter_map(move |w| w.get(weekday))
    }

    pub fn cells(&self) -> impl Iterator<Item = &HeatmapCell> + '_ {
        self.weeks.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contributions::record_focus;
    use chrono::Weekday;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(contribution_level(0), 0);
        assert_eq!(contribution_level(1), 1);
        assert_eq!(contribution_level(24), 1);
        assert_eq!(contribution_level(25), 2);
        assert_eq!(contribution_level(59), 2);
        assert_eq!(contribution_level(60), 3);
        assert_eq!(contribution_level(119), 3);
        assert_eq!(contribution_level(120), 4);
        assert_eq!(contribution_level(10_000), 4);
    }

    #[test]
    fn grid_is_whole_monday_weeks() {
        // Wednesday
        let today = d("2024-07-17");
        let map = Heatmap::build(&ContributionHistory::new(), today);
        assert!(map.weeks.iter().all(|w| w.len() == 7));
        assert_eq!(map.weeks[0][0].day.weekday(), Weekday::Mon);
        assert!(map.weeks[0][0].day <= d("2024-01-17"));
        assert_eq!(map.weeks.last().unwrap()[6].day, d("2024-07-21"));
    }

    #[test]
    fn future_days_have_no_level() {
        let today = d("2024-07-17");
        let map = Heatmap::build(&ContributionHistory::new(), today);
        let future: Vec<_> = map.cells().filter(|c| c.is_future()).map(|c| c.day).collect();
        assert_eq!(future, vec![d("2024-07-18"), d("2024-07-19"), d("2024-07-20"), d("2024-07-21")]);
    }

    #[test]
    fn cells_carry_history_minutes() {
        let today = d("2024-07-17");
        let history = record_focus(&ContributionHistory::new(), d("2024-07-15"), 75);
        let map = Heatmap::build(&history, today);
        let cell = map.cells().find(|c| c.day == d("2024-07-15")).unwrap();
        assert_eq!(cell.minutes, 75);
        assert_eq!(cell.level, Some(3));
        assert_eq!(cell.describe(), "75 minutes on Monday, July 15, 2024");
    }

    #[test]
    fn row_selects_weekday() {
        let map = Heatmap::build(&ContributionHistory::new(), d("2024-07-17"));
        assert!(map.row(4).all(|c| c.day.weekday() == Weekday::Fri));
        assert_eq!(map.row(4).count(), map.weeks.len());
    }

    #[test]
    fn empty_day_description() {
        let cell = HeatmapCell {
            day: d("2024-01-01"),
            minutes: 0,
            level: Some(0),
        };
        assert_eq!(cell.describe(), "No contributions on Monday, January 1, 2024");
    }
}
