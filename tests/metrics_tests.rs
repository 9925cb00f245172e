// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metrics pipeline over records read back from a synced store.
//!
//! These mirror what the dashboard does: load the table, apply the selected
//! filter, then compute totals, cumulative series, streaks and the heatmap.

use strava_analytics::config::SyncMode;
use strava_analytics::models::{ActivityFilter, StreakStats};
use strava_analytics::services::metrics;
use strava_analytics::services::IngestionEngine;

mod common;
use common::{raw_activity, test_state, FakeSource};

async fn synced_records() -> Vec<strava_analytics::models::ActivityRecord> {
    let (_dir, state) = test_state(SyncMode::Incremental);
    let source = FakeSource::new(vec![
        raw_activity(1, "Run", "2023-12-30T07:00:00Z", 3_000.0),
        raw_activity(2, "root='Run'", "2023-12-31T07:00:00Z", 5_000.0),
        raw_activity(3, "Ride", "2024-01-01T09:00:00+01:00", 20_000.0),
        raw_activity(4, "Run", "2024-01-01T18:00:00Z", 2_000.0),
        raw_activity(5, "Run", "2024-01-05T07:00:00Z", 10_000.0),
    ]);
    IngestionEngine::new(&source, &state.records, SyncMode::Incremental)
        .sync()
        .await
        .unwrap();
    state.records.load_all().unwrap()
}

#[tokio::test]
async fn test_types_are_grouped_after_normalization() {
    let records = synced_records().await;
    assert_eq!(metrics::available_types(&records), vec!["Ride", "Run"]);
    assert_eq!(metrics::available_years(&records), vec![2023, 2024]);
}

#[tokio::test]
async fn test_filtered_dashboard_values() {
    let records = synced_records().await;
    let runs_2024 = metrics::filter_records(
        &records,
        &ActivityFilter::default().with_years([2024]).with_types(["Run"]),
    );

    let totals = metrics::totals(&runs_2024);
    assert_eq!(totals.activity_count, 2);
    assert_eq!(totals.total_distance_km, 12.0);

    let cumulative: Vec<f64> = metrics::derive_metrics(&runs_2024)
        .iter()
        .map(|e| e.metrics.cumulative_distance_km)
        .collect();
    assert_eq!(cumulative, vec![2.0, 12.0]);
}

#[tokio::test]
async fn test_streaks_over_distinct_dates() {
    let records = synced_records().await;

    // Dec 30, Dec 31, Jan 1 (twice), Jan 5.
    assert_eq!(
        metrics::activity_streaks(&records),
        StreakStats {
            max_streak_days: 3,
            current_streak_days: 1
        }
    );

    let only_2023 = metrics::filter_records(&records, &ActivityFilter::default().with_years([2023]));
    assert_eq!(
        metrics::activity_streaks(&only_2023),
        StreakStats {
            max_streak_days: 2,
            current_streak_days: 2
        }
    );
}

#[tokio::test]
async fn test_energy_estimates_are_per_type() {
    let records = synced_records().await;
    let enriched = metrics::derive_metrics(&records);
    let ride = enriched.iter().find(|e| e.record.id == 3).unwrap();
    let run = enriched.iter().find(|e| e.record.id == 5).unwrap();

    assert_eq!(ride.metrics.estimated_energy_kcal, 500.0);
    assert_eq!(run.metrics.estimated_energy_kcal, 750.0);
}

#[tokio::test]
async fn test_heatmap_for_year_with_sparse_activity() {
    let records = synced_records().await;
    let heatmap = metrics::calendar_heatmap(&records, 2024);

    assert_eq!(heatmap.days.len(), 366);
    assert_eq!(heatmap.days[0].distance_km, 22.0);
    assert_eq!(heatmap.days[4].distance_km, 10.0);
    assert_eq!(heatmap.days.iter().filter(|d| d.distance_km == 0.0).count(), 364);
}

#[test]
fn test_empty_filter_result_is_not_an_error() {
    let filter = ActivityFilter::default().with_years([1999]);
    let filtered = metrics::filter_records(&[], &filter);

    assert_eq!(metrics::totals(&filtered).activity_count, 0);
    assert_eq!(metrics::activity_streaks(&filtered), StreakStats::default());
    assert_eq!(metrics::calendar_heatmap(&filtered, 1999).days.len(), 365);
    assert!(metrics::derive_metrics(&filtered).is_empty());
}
