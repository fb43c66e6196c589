//! Focus-minute contributions per calendar day.
//!
//! [`ContributionHistory`] is the authoritative data. [`heatmap`] only buckets
//! it for display.

pub mod heatmap;
mod history;

pub use heatmap::{contribution_level, Heatmap, HeatmapCell, HEATMAP_MONTHS};
pub use history::{day_key, record_focus, ContributionHistory};
