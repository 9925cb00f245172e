//! Segment leaderboard placements.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One top-10 placement on a segment, taken from a recent activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub segment_name: String,
    /// KOM rank if present, else personal-record rank (1..=10)
    pub rank: u32,
    pub activity_id: u64,
    pub activity_date: NaiveDate,
    /// Elapsed time on the segment, e.g. "4:05" or "1:02:03"
    #[serde(alias = "time_str")]
    pub elapsed_time_display: String,
}
