// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava-Analytics update job
//!
//! Syncs the activity table from Strava and refreshes the segment
//! leaderboard, then exits. Meant to be run on a schedule.

use strava_analytics::{
    config::Config,
    services::{run_update, StravaClient},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        mode = ?config.sync_mode,
        leaderboard = config.leaderboard_enabled,
        "Starting Strava-Analytics update"
    );

    let client = StravaClient::from_config(&config);
    let state = AppState::new(config);

    let report = run_update(&state, &client).await?;

    if let Some(reason) = &report.sync.aborted {
        tracing::warn!(reason = %reason, "Sync ended early; partial results were saved");
    }
    tracing::info!(
        stored = report.sync.stored,
        skipped = report.sync.skipped,
        leaderboard_entries = report.leaderboard.as_ref().map(Vec::len),
        "Update complete"
    );
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("strava_analytics=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
