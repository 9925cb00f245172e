// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava-Analytics: keep a local copy of a Strava activity history and
//! compute dashboard analytics from it.
//!
//! This crate provides the sync engine that maintains the activity table and
//! segment leaderboard, and the pure metrics pipeline that the dashboard reads.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{LeaderboardStore, RecordStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub records: RecordStore,
    pub leaderboard: LeaderboardStore,
}

impl AppState {
    /// Build state with both stores rooted at `config.data_dir`.
    pub fn new(config: Config) -> Self {
        let records = RecordStore::new(&config.data_dir);
        let leaderboard = LeaderboardStore::new(&config.data_dir);
        Self {
            config,
            records,
            leaderboard,
        }
    }
}
