// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod leaderboard;
pub mod stats;

pub use activity::{ActivityRecord, ACTIVITY_COLUMNS};
pub use leaderboard::LeaderboardEntry;
pub use stats::{
    ActivityFilter, ActivityTotals, CalendarHeatmap, DerivedMetrics, EnrichedActivity,
    HeatmapDay, StreakStats,
};
