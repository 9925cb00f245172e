// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod ingest;
pub mod leaderboard;
pub mod metrics;
pub mod source;
pub mod strava;
pub mod update;

pub use ingest::{IngestionEngine, SyncOutcome, SyncReport};
pub use leaderboard::LeaderboardEnricher;
pub use source::{ActivitySource, RawActivity, RawActivityDetail, RawQuantity, RawSegmentEffort};
pub use strava::StravaClient;
pub use update::{run_update, UpdateReport};
