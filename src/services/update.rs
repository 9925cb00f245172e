// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One scheduled update of the data directory.
//!
//! Handles the job workflow:
//! 1. Sync activities into the record store (mode from config)
//! 2. Refresh the leaderboard from the newest activities, or just make sure
//!    an empty leaderboard document exists when enrichment is disabled

use crate::error::Result;
use crate::models::LeaderboardEntry;
use crate::services::ingest::{IngestionEngine, SyncReport};
use crate::services::leaderboard::LeaderboardEnricher;
use crate::services::source::ActivitySource;
use crate::AppState;

/// Result of one update job.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub sync: SyncReport,
    /// `None` when enrichment is disabled
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
}

/// Run sync, then the leaderboard pass, against `source`.
pub async fn run_update<S: ActivitySource + ?Sized>(
    state: &AppState,
    source: &S,
) -> Result<UpdateReport> {
    let config = &state.config;

    let outcome = IngestionEngine::new(source, &state.records, config.sync_mode)
        .with_progress_interval(config.progress_interval)
        .sync()
        .await?;

    let leaderboard = if config.leaderboard_enabled {
        let entries = LeaderboardEnricher::new(source, &state.leaderboard)
            .refresh(&outcome.records, config.leaderboard_recent_count)
            .await?;
        Some(entries)
    } else {
        tracing::info!("Leaderboard refresh disabled, skipping");
        state.leaderboard.ensure_exists()?;
        None
    };

    Ok(UpdateReport {
        sync: outcome.report,
        leaderboard,
    })
}
