//! Derived analytics models consumed by the dashboard.
//!
//! None of these are persisted. They are recomputed from a snapshot of the
//! record store on every query by `services::metrics`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::ActivityRecord;

/// Per-activity derived fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    // ─── Calendar ────────────────────────────────────────────────
    pub year: i32,
    pub month: u32,
    pub iso_week: u32,
    pub day_of_year: u32,
    /// English weekday name ("Monday")
    pub weekday_name: String,
    pub hour_of_day: u32,

    // ─── Running totals within the activity's year ───────────────
    pub cumulative_distance_km: f64,
    pub cumulative_elevation_m: f64,

    /// Energy in kcal. Device reading when available, otherwise a per-type
    /// distance heuristic. This is an estimate, not measured data.
    pub estimated_energy_kcal: f64,
}

/// An activity with its derived fields attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedActivity {
    #[serde(flatten)]
    pub record: ActivityRecord,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

/// Consecutive-day statistics over distinct activity dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
    pub max_streak_days: u32,
    /// Length of the run ending at the latest activity date
    pub current_streak_days: u32,
}

/// Headline totals for a (filtered) record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTotals {
    pub activity_count: u32,
    pub total_distance_km: f64,
    pub total_elevation_m: f64,
    pub total_moving_time_min: f64,
    pub pr_count: u32,
    pub kudos: u32,
}

impl ActivityTotals {
    /// Fold one activity into the totals.
    pub fn add(&mut self, activity: &ActivityRecord) {
        self.activity_count += 1;
        self.total_distance_km += activity.distance_km;
        self.total_elevation_m += activity.elevation_gain_m;
        self.total_moving_time_min += activity.moving_time_min;
        self.pr_count += activity.pr_count;
        self.kudos += activity.kudos;
    }
}

/// Year and activity-type selection made by the presentation layer.
///
/// An empty set on either axis means "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub years: BTreeSet<i32>,
    #[serde(default)]
    pub activity_types: BTreeSet<String>,
}

impl ActivityFilter {
    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years.extend(years);
        self
    }

    pub fn with_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.activity_types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Check whether an activity passes the filter.
    pub fn matches(&self, activity: &ActivityRecord) -> bool {
        use chrono::Datelike;

        (self.years.is_empty() || self.years.contains(&activity.start_timestamp.year()))
            && (self.activity_types.is_empty()
                || self.activity_types.contains(&activity.activity_type))
    }
}

/// One day of the zero-filled calendar series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub distance_km: f64,
}

/// Day-by-day distance for one year, plus its weekday × week layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarHeatmap {
    pub year: i32,
    /// Every day Jan 1..=Dec 31, days without activity are 0.0
    pub days: Vec<HeatmapDay>,
    /// ISO week number of each matrix column
    pub week_labels: Vec<u32>,
    /// `cells[weekday][column]`, weekday 0 = Monday. `None` marks padding
    /// cells that fall outside the year.
    pub cells: [Vec<Option<f64>>; 7],
}
