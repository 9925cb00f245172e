// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived metrics over a snapshot of the record store.
//!
//! Every function here is pure: it takes an explicit slice of records (already
//! filtered if the caller wants that) and never touches the store, so repeated
//! or concurrent calls with different filters cannot interfere. All of them
//! accept an empty slice and return empty or zero results.

use crate::models::{
    ActivityFilter, ActivityRecord, ActivityTotals, CalendarHeatmap, DerivedMetrics,
    EnrichedActivity, HeatmapDay, StreakStats,
};
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use std::collections::{BTreeSet, HashMap};

/// Heuristic kcal per km for activities without an energy reading.
const RUN_KCAL_PER_KM: f64 = 75.0;
const RIDE_KCAL_PER_KM: f64 = 25.0;
const OTHER_KCAL_PER_KM: f64 = 40.0;

/// Records passing `filter`, in input order.
pub fn filter_records(records: &[ActivityRecord], filter: &ActivityFilter) -> Vec<ActivityRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// Distinct years present, ascending.
pub fn available_years(records: &[ActivityRecord]) -> Vec<i32> {
    records
        .iter()
        .map(|r| r.start_timestamp.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct activity types present, sorted.
pub fn available_types(records: &[ActivityRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.activity_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Headline totals.
pub fn totals(records: &[ActivityRecord]) -> ActivityTotals {
    records.iter().fold(ActivityTotals::default(), |mut acc, r| {
        acc.add(r);
        acc
    })
}

/// Energy in kcal for one activity.
///
/// A genuine device reading (> 0) is used verbatim; Strava reports work in kJ,
/// which is taken as kcal at the usual ~1:1 metabolic conversion. Otherwise
/// this is an estimate: distance × a per-type rate (Run 75, Ride 25, other 40
/// kcal/km).
pub fn estimated_energy_kcal(record: &ActivityRecord) -> f64 {
    match record.energy_kj {
        Some(kj) if kj > 0.0 => kj,
        _ => {
            let rate = match record.activity_type.as_str() {
                "Run" => RUN_KCAL_PER_KM,
                "Ride" => RIDE_KCAL_PER_KM,
                _ => OTHER_KCAL_PER_KM,
            };
            record.distance_km * rate
        }
    }
}

/// Attach derived fields to every record.
///
/// Output is sorted by start timestamp ascending. Cumulative distance and
/// elevation are running sums within each calendar year and restart at the
/// first activity of the next year.
pub fn derive_metrics(records: &[ActivityRecord]) -> Vec<EnrichedActivity> {
    let mut sorted: Vec<&ActivityRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.start_timestamp
            .cmp(&b.start_timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut current_year = None;
    let mut distance = 0.0;
    let mut elevation = 0.0;

    sorted
        .into_iter()
        .map(|record| {
            let year = record.start_timestamp.year();
            if current_year != Some(year) {
                current_year = Some(year);
                distance = 0.0;
                elevation = 0.0;
            }
            distance += record.distance_km;
            elevation += record.elevation_gain_m;

            let ts = record.start_timestamp;
            EnrichedActivity {
                metrics: DerivedMetrics {
                    year,
                    month: ts.month(),
                    iso_week: ts.iso_week().week(),
                    day_of_year: ts.ordinal(),
                    weekday_name: weekday_name(ts.weekday()).to_string(),
                    hour_of_day: ts.hour(),
                    cumulative_distance_km: distance,
                    cumulative_elevation_m: elevation,
                    estimated_energy_kcal: estimated_energy_kcal(record),
                },
                record: record.clone(),
            }
        })
        .collect()
}

/// Streak statistics over calendar dates.
///
/// Dates are sorted and deduplicated first, so any collection of dates is
/// accepted. A gap of exactly one day extends the running streak, any other
/// gap restarts it at 1.
pub fn calculate_streaks(dates: &[NaiveDate]) -> StreakStats {
    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();

    let mut stats = StreakStats::default();
    let mut previous: Option<NaiveDate> = None;
    let mut run = 0u32;

    for date in distinct {
        run = match previous {
            Some(prev) if (date - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        stats.max_streak_days = stats.max_streak_days.max(run);
        previous = Some(date);
    }

    stats.current_streak_days = run;
    stats
}

/// Streak statistics over the distinct activity dates of `records`.
pub fn activity_streaks(records: &[ActivityRecord]) -> StreakStats {
    let dates: Vec<NaiveDate> = records.iter().map(ActivityRecord::date).collect();
    calculate_streaks(&dates)
}

/// Zero-filled daily distance for `year` and its weekday × week layout.
///
/// Records from other years are ignored. Columns are Monday-started weeks, so
/// the first and last column may be partial; cells outside the year are `None`.
pub fn calendar_heatmap(records: &[ActivityRecord], year: i32) -> CalendarHeatmap {
    let mut heatmap = CalendarHeatmap {
        year,
        days: Vec::new(),
        week_labels: Vec::new(),
        cells: Default::default(),
    };

    let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return heatmap;
    };

    let mut per_day: HashMap<NaiveDate, f64> = HashMap::new();
    for record in records.iter().filter(|r| r.start_timestamp.year() == year) {
        *per_day.entry(record.date()).or_insert(0.0) += record.distance_km;
    }

    let offset = jan1.weekday().num_days_from_monday() as usize;
    heatmap.days = jan1
        .iter_days()
        .take_while(|d| d.year() == year)
        .map(|date| HeatmapDay {
            date,
            distance_km: per_day.get(&date).copied().unwrap_or(0.0),
        })
        .collect();

    let columns = (heatmap.days.len() - 1 + offset) / 7 + 1;
    for row in heatmap.cells.iter_mut() {
        *row = vec![None; columns];
    }

    for (index, day) in heatmap.days.iter().enumerate() {
        let column = (index + offset) / 7;
        let weekday = day.date.weekday().num_days_from_monday() as usize;
        if heatmap.week_labels.len() <= column {
            heatmap.week_labels.push(day.date.iso_week().week());
        }
        heatmap.cells[weekday][column] = Some(day.distance_km);
    }

    heatmap
}

/// Cumulative distance series per year, keyed by day of year, for the
/// year-over-year comparison chart.
pub fn yearly_progress(records: &[ActivityRecord]) -> Vec<(i32, Vec<(u32, f64)>)> {
    let mut series: Vec<(i32, Vec<(u32, f64)>)> = Vec::new();
    for enriched in derive_metrics(records) {
        let point = (
            enriched.metrics.day_of_year,
            enriched.metrics.cumulative_distance_km,
        );
        match series.last_mut() {
            Some((year, points)) if *year == enriched.metrics.year => points.push(point),
            _ => series.push((enriched.metrics.year, vec![point])),
        }
    }
    series
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
