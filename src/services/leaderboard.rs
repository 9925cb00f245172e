// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort segment leaderboard enrichment.
//!
//! For the most recent activities, fetch each detail individually and keep the
//! efforts that placed in the top 10. A failing detail fetch is logged and
//! skipped; a rate limit or rejected token ends the pass with what was found
//! so far. The result always replaces the previous leaderboard document.

use crate::db::LeaderboardStore;
use crate::error::Result;
use crate::models::{ActivityRecord, LeaderboardEntry};
use crate::services::source::{quantity_value, ActivitySource, RawActivityDetail};
use crate::time_utils::format_elapsed;

/// Number of recent activities enriched by default.
pub const DEFAULT_RECENT_COUNT: usize = 5;

/// Worst rank still shown on the leaderboard.
pub const MAX_RANK: u32 = 10;

/// Fetches effort details and maintains the leaderboard document.
pub struct LeaderboardEnricher<'a, S: ActivitySource + ?Sized> {
    source: &'a S,
    store: &'a LeaderboardStore,
}

impl<'a, S: ActivitySource + ?Sized> LeaderboardEnricher<'a, S> {
    pub fn new(source: &'a S, store: &'a LeaderboardStore) -> Self {
        Self { source, store }
    }

    /// Extract top-rank entries for the given activities, in the given order.
    pub async fn enrich(&self, recent: &[ActivityRecord]) -> Vec<LeaderboardEntry> {
        let mut entries = Vec::new();

        for activity in recent {
            match self.source.fetch_activity_detail(activity.id).await {
                Ok(detail) => {
                    let found = top_efforts(activity, &detail);
                    tracing::debug!(
                        activity_id = activity.id,
                        efforts = detail.segment_efforts.len(),
                        placements = found.len(),
                        "Activity detail processed"
                    );
                    entries.extend(found);
                }
                Err(e) if e.is_rate_limited() || e.is_strava_token_error() => {
                    // Every remaining request would fail the same way.
                    tracing::warn!(
                        activity_id = activity.id,
                        error = %e,
                        "Stopping leaderboard enrichment early"
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        activity_id = activity.id,
                        error = %e,
                        "Skipping leaderboard enrichment for activity"
                    );
                }
            }
        }

        entries
    }

    /// Enrich the `count` most recent of `records` and replace the stored
    /// leaderboard with the result.
    pub async fn refresh(
        &self,
        records: &[ActivityRecord],
        count: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let recent = most_recent(records, count);
        tracing::info!(activities = recent.len(), "Refreshing segment leaderboard");

        let entries = self.enrich(&recent).await;
        self.store.replace_all(&entries)?;

        tracing::info!(entries = entries.len(), "Leaderboard replaced");
        Ok(entries)
    }
}

/// The `count` records with the latest start timestamps, newest first.
pub fn most_recent(records: &[ActivityRecord], count: usize) -> Vec<ActivityRecord> {
    let mut sorted: Vec<&ActivityRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.start_timestamp
            .cmp(&a.start_timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
    sorted.into_iter().take(count).cloned().collect()
}

/// Efforts of one activity that ranked 1..=10.
pub fn top_efforts(activity: &ActivityRecord, detail: &RawActivityDetail) -> Vec<LeaderboardEntry> {
    detail
        .segment_efforts
        .iter()
        .filter_map(|effort| {
            let rank = effort.rank().filter(|r| (1..=MAX_RANK).contains(r))?;
            let segment_name = effort.segment_name()?.to_string();
            // A malformed elapsed time still leaves a valid placement.
            let elapsed = quantity_value(effort.elapsed_time.as_ref()).unwrap_or(0.0);

            Some(LeaderboardEntry {
                segment_name,
                rank,
                activity_id: activity.id,
                activity_date: activity.date(),
                elapsed_time_display: format_elapsed(elapsed),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::{RawQuantity, RawSegment, RawSegmentEffort};
    use crate::time_utils::parse_start_timestamp;

    fn make_activity(id: u64, date: &str) -> ActivityRecord {
        ActivityRecord {
            id,
            name: format!("Ride {}", id),
            start_timestamp: parse_start_timestamp(date).unwrap(),
            distance_km: 30.0,
            moving_time_min: 60.0,
            elevation_gain_m: 300.0,
            activity_type: "Ride".to_string(),
            average_speed_kmh: 30.0,
            pr_count: 0,
            kudos: 0,
            energy_kj: None,
        }
    }

    fn effort(name: &str, kom: Option<u32>, pr: Option<u32>, secs: f64) -> RawSegmentEffort {
        RawSegmentEffort {
            name: None,
            segment: Some(RawSegment {
                name: Some(name.to_string()),
            }),
            elapsed_time: Some(RawQuantity::Plain(secs)),
            kom_rank: kom,
            pr_rank: pr,
        }
    }

    #[test]
    fn test_top_efforts_rank_policy() {
        let activity = make_activity(7, "2024-06-01T09:00:00");
        let detail = RawActivityDetail {
            id: 7,
            segment_efforts: vec![
                effort("KOM holder", Some(1), Some(3), 245.0),
                effort("PR only", None, Some(2), 3723.0),
                effort("Too slow", Some(11), None, 60.0),
                effort("Unranked", None, None, 60.0),
                effort("Edge", Some(10), None, 59.0),
            ],
        };

        let entries = top_efforts(&activity, &detail);
        let summary: Vec<(&str, u32, &str)> = entries
            .iter()
            .map(|e| {
                (
                    e.segment_name.as_str(),
                    e.rank,
                    e.elapsed_time_display.as_str(),
                )
            })
            .collect();

        assert_eq!(
            summary,
            vec![
                ("KOM holder", 1, "4:05"),
                ("PR only", 2, "1:02:03"),
                ("Edge", 10, "0:59"),
            ]
        );
        assert!(entries.iter().all(|e| e.activity_id == 7));
        assert_eq!(entries[0].activity_date, activity.date());
    }

    #[test]
    fn test_kom_rank_outside_top_ten_hides_pr_rank() {
        // kom_rank wins even when it is worse than the PR rank.
        let activity = make_activity(1, "2024-06-01T09:00:00");
        let detail = RawActivityDetail {
            id: 1,
            segment_efforts: vec![effort("Climb", Some(25), Some(1), 100.0)],
        };
        assert!(top_efforts(&activity, &detail).is_empty());
    }

    #[test]
    fn test_most_recent_selects_newest() {
        let records = vec![
            make_activity(1, "2024-01-01T08:00:00"),
            make_activity(2, "2024-03-01T08:00:00"),
            make_activity(3, "2024-02-01T08:00:00"),
        ];
        let ids: Vec<u64> = most_recent(&records, 2).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(most_recent(&records, 0).is_empty());
        assert_eq!(most_recent(&records, 10).len(), 3);
    }
}
