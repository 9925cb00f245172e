// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote activity source abstraction and its raw payload types.
//!
//! The raw types mirror what the fitness API hands back, quirks included:
//! numeric fields may arrive as plain numbers or wrapped in unit/duration
//! objects. [`quantity_value`] is the single place those shapes are unwrapped.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures_util::stream::BoxStream;
use serde::Deserialize;

/// Stream of raw activities. An `Err` item is a transport failure and ends the
/// fetch.
pub type ActivityStream<'a> = BoxStream<'a, Result<RawActivity, AppError>>;

/// Remote capability the ingestion engine and leaderboard enricher pull from.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Stream activities started after `since` (all history when `None`).
    fn fetch_activities(&self, since: Option<NaiveDateTime>) -> ActivityStream<'_>;

    /// Fetch one activity with its segment efforts.
    async fn fetch_activity_detail(&self, activity_id: u64) -> Result<RawActivityDetail, AppError>;
}

/// A numeric field as the remote side may present it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Plain(f64),
    Magnitude { magnitude: f64 },
    Num { num: f64 },
    Duration { total_seconds: f64 },
    Seconds { seconds: f64 },
    Text(String),
    /// Any other shape; rejected during normalization.
    Other(serde_json::Value),
}

impl From<f64> for RawQuantity {
    fn from(value: f64) -> Self {
        RawQuantity::Plain(value)
    }
}

/// Unwrap a possibly-wrapped quantity into a plain number.
///
/// An absent field counts as zero. Text must hold a number, optionally
/// followed by a unit (`"1200 m"`).
pub fn quantity_value(quantity: Option<&RawQuantity>) -> Result<f64, String> {
    let value = match quantity {
        None => 0.0,
        Some(RawQuantity::Plain(v))
        | Some(RawQuantity::Magnitude { magnitude: v })
        | Some(RawQuantity::Num { num: v })
        | Some(RawQuantity::Duration { total_seconds: v })
        | Some(RawQuantity::Seconds { seconds: v }) => *v,
        Some(RawQuantity::Text(text)) => text
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<f64>().ok())
            .ok_or_else(|| text.clone())?,
        Some(RawQuantity::Other(value)) => return Err(value.to_string()),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(value.to_string())
    }
}

/// Summary activity as listed by the remote API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivity {
    pub id: Option<u64>,
    pub name: Option<String>,
    /// Local wall-clock start time
    pub start_date_local: Option<String>,
    /// UTC start time, used when the local one is absent
    pub start_date: Option<String>,
    /// Activity type; may carry framing such as `root='Run'`
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub sport_type: Option<String>,
    /// Meters
    pub distance: Option<RawQuantity>,
    /// Seconds
    pub moving_time: Option<RawQuantity>,
    /// Meters
    pub total_elevation_gain: Option<RawQuantity>,
    /// Meters per second
    pub average_speed: Option<RawQuantity>,
    pub kilojoules: Option<RawQuantity>,
    pub pr_count: Option<u32>,
    pub kudos_count: Option<u32>,
}

/// Detailed activity with its segment efforts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivityDetail {
    pub id: u64,
    #[serde(default)]
    pub segment_efforts: Vec<RawSegmentEffort>,
}

/// One effort on a segment within an activity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSegmentEffort {
    pub name: Option<String>,
    pub segment: Option<RawSegment>,
    /// Seconds
    pub elapsed_time: Option<RawQuantity>,
    pub kom_rank: Option<u32>,
    pub pr_rank: Option<u32>,
}

impl RawSegmentEffort {
    /// Segment name, preferring the segment object over the effort label.
    pub fn segment_name(&self) -> Option<&str> {
        self.segment
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .or(self.name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }

    /// KOM rank if present, else personal-record rank.
    pub fn rank(&self) -> Option<u32> {
        self.kom_rank.or(self.pr_rank)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSegment {
    pub name: Option<String>,
}
