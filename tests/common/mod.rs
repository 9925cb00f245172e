// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::sync::Mutex;
use strava_analytics::config::{Config, SyncMode};
use strava_analytics::error::AppError;
use strava_analytics::services::source::{
    ActivitySource, ActivityStream, RawActivity, RawActivityDetail, RawQuantity, RawSegment,
    RawSegmentEffort,
};
use strava_analytics::time_utils::parse_start_timestamp;
use strava_analytics::AppState;
use tempfile::TempDir;

/// In-memory stand-in for the remote API.
///
/// Honors `since` the way the remote does (strictly after), can fail the
/// activity stream after N items, and serves per-activity details.
#[derive(Default)]
pub struct FakeSource {
    activities: Mutex<Vec<RawActivity>>,
    fail_after: Mutex<Option<usize>>,
    details: Mutex<HashMap<u64, RawActivityDetail>>,
    detail_failures: Mutex<HashMap<u64, String>>,
    pub requested_since: Mutex<Vec<Option<NaiveDateTime>>>,
    pub detail_requests: Mutex<Vec<u64>>,
}

#[allow(dead_code)]
impl FakeSource {
    pub fn new(activities: Vec<RawActivity>) -> Self {
        Self {
            activities: Mutex::new(activities),
            ..Default::default()
        }
    }

    pub fn set_activities(&self, activities: Vec<RawActivity>) {
        *self.activities.lock().unwrap() = activities;
    }

    pub fn push_activity(&self, activity: RawActivity) {
        self.activities.lock().unwrap().push(activity);
    }

    /// Yield a transport error after `count` activities.
    pub fn fail_after(&self, count: Option<usize>) {
        *self.fail_after.lock().unwrap() = count;
    }

    pub fn set_detail(&self, detail: RawActivityDetail) {
        self.details.lock().unwrap().insert(detail.id, detail);
    }

    /// Answer the detail request for `activity_id` with a remote error.
    pub fn fail_detail(&self, activity_id: u64, message: &str) {
        self.detail_failures
            .lock()
            .unwrap()
            .insert(activity_id, message.to_string());
    }
}

#[async_trait]
impl ActivitySource for FakeSource {
    fn fetch_activities(&self, since: Option<NaiveDateTime>) -> ActivityStream<'_> {
        self.requested_since.lock().unwrap().push(since);

        let mut items: Vec<Result<RawActivity, AppError>> = self
            .activities
            .lock()
            .unwrap()
            .iter()
            .filter(|a| match (since, start_of(a)) {
                (Some(cursor), Some(start)) => start > cursor,
                _ => true,
            })
            .cloned()
            .map(Ok)
            .collect();

        if let Some(count) = *self.fail_after.lock().unwrap() {
            items.truncate(count);
            items.push(Err(AppError::StravaApi("connection reset".to_string())));
        }

        stream::iter(items).boxed()
    }

    async fn fetch_activity_detail(&self, activity_id: u64) -> Result<RawActivityDetail, AppError> {
        self.detail_requests.lock().unwrap().push(activity_id);
        if let Some(message) = self.detail_failures.lock().unwrap().get(&activity_id) {
            return Err(AppError::StravaApi(message.clone()));
        }
        self.details
            .lock()
            .unwrap()
            .get(&activity_id)
            .cloned()
            .ok_or_else(|| AppError::StravaApi(format!("HTTP 404 Not Found: {}", activity_id)))
    }
}

fn start_of(activity: &RawActivity) -> Option<NaiveDateTime> {
    activity
        .start_date_local
        .as_deref()
        .and_then(parse_start_timestamp)
}

/// A well-formed raw activity as the remote would list it.
#[allow(dead_code)]
pub fn raw_activity(id: u64, kind: &str, start: &str, distance_m: f64) -> RawActivity {
    RawActivity {
        id: Some(id),
        name: Some(format!("Activity {}", id)),
        start_date_local: Some(start.to_string()),
        activity_type: Some(kind.to_string()),
        distance: Some(RawQuantity::Plain(distance_m)),
        moving_time: Some(RawQuantity::Plain(1800.0)),
        total_elevation_gain: Some(RawQuantity::Magnitude { magnitude: 50.0 }),
        average_speed: Some(RawQuantity::Plain(5.0)),
        pr_count: Some(0),
        kudos_count: Some(1),
        ..Default::default()
    }
}

/// A segment effort with the given ranks.
#[allow(dead_code)]
pub fn effort(name: &str, kom: Option<u32>, pr: Option<u32>, secs: f64) -> RawSegmentEffort {
    RawSegmentEffort {
        name: Some(name.to_string()),
        segment: Some(RawSegment {
            name: Some(name.to_string()),
        }),
        elapsed_time: Some(RawQuantity::Plain(secs)),
        kom_rank: kom,
        pr_rank: pr,
    }
}

/// App state rooted in a fresh temp dir. Keep the `TempDir` alive.
#[allow(dead_code)]
pub fn test_state(mode: SyncMode) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        sync_mode: mode,
        ..Config::default()
    };
    (dir, AppState::new(config))
}
