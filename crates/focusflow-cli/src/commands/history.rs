use clap::Subcommand;
use focusflow_core::contributions::Heatmap;
use focusflow_core::ContributionHistory;

use super::{open_session, print_json, CmdResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List focus minutes per day
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Draw the last six months as a week grid
    Heatmap {
        /// Output the cells as JSON
        #[arg(long)]
        json: bool,
    },
}

const LEVEL_GLYPHS: [char; 5] = ['·', '░', '▒', '▓', '█'];
const WEEKDAY_LABELS: [&str; 7] = ["Mon", "", "Wed", "", "Fri", "", ""];

pub fn run(action: HistoryAction) -> CmdResult {
    let session = open_session()?;
    match action {
        HistoryAction::Show { json: true } => print_json(session.history())?,
        HistoryAction::Show { json: false } => print!("{}", render_list(session.history())),
        HistoryAction::Heatmap { json } => {
            let heatmap = Heatmap::build(session.history(), session.today());
            if json {
                print_json(&heatmap)?;
            } else {
                print!("{}", render_grid(&heatmap));
            }
        }
    }
    Ok(())
}

fn render_list(history: &ContributionHistory) -> String {
    if history.is_empty() {
        return "No contributions yet.\n".to_string();
    }
    let mut out = String::new();
    for (day, minutes) in history.iter() {
        out.push_str(&format!("{day}  {minutes:>5} min\n"));
    }
    out.push_str(&format!(
        "{} min over {} days\n",
        history.total_minutes(),
        history.active_days()
    ));
    out
}

fn render_grid(heatmap: &Heatmap) -> String {
    let mut out = String::new();
    for (weekday, label) in WEEKDAY_LABELS.iter().enumerate() {
        out.push_str(&format!("{label:<4}"));
        for cell in heatmap.row(weekday) {
            let glyph = match cell.level {
                Some(level) => LEVEL_GLYPHS[usize::from(level.min(4))],
                None => ' ',
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out.push_str("    Less ");
    out.extend(LEVEL_GLYPHS.iter());
    out.push_str(" More\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn list_shows_days_and_totals() {
        let history = ContributionHistory::new()
            .with_focus(d("2024-01-01"), 50)
            .with_focus(d("2024-01-03"), 25);
        let text = render_list(&history);
        assert!(text.contains("2024-01-01     50 min"));
        assert!(text.contains("75 min over 2 days"));
    }

    #[test]
    fn empty_list_says_so() {
        assert_eq!(render_list(&ContributionHistory::new()), "No contributions yet.\n");
    }

    #[test]
    fn grid_has_a_row_per_weekday_and_marks_levels() {
        // 2024-01-03 is a Wednesday.
        let today = d("2024-01-03");
        let history = ContributionHistory::new().with_focus(today, 130);
        let grid = render_grid(&Heatmap::build(&history, today));
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[2].starts_with("Wed ") && lines[2].ends_with('█'));
        // Days after today in the current week are blank.
        assert!(lines[3].ends_with(' '));
    }
}
