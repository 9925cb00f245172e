// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.
//!
//! Activity timestamps are local wall-clock times (`NaiveDateTime`). Anything
//! zone-aware is reduced to its own wall-clock reading here, at the boundary,
//! so nothing downstream ever mixes naive and zone-aware values.

use chrono::{DateTime, NaiveDateTime};

/// Canonical on-disk timestamp format.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse an activity start timestamp into local wall-clock time.
///
/// Accepts RFC 3339 (`2024-01-15T10:00:00Z`, `...+02:00`), the space-separated
/// offset form written by dataframe tools (`2024-01-15 10:00:00+00:00`), and
/// naive timestamps with `T` or space separators.
pub fn parse_start_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Format a local timestamp in the canonical on-disk format.
pub fn format_local_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(LOCAL_TIMESTAMP_FORMAT).to_string()
}

/// Format an elapsed duration as `H:MM:SS`, or `M:SS` under an hour.
pub fn format_elapsed(total_seconds: f64) -> String {
    let secs = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds.round() as u64
    } else {
        0
    };
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Serde adapter for local timestamps in the record store.
pub mod local_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_local_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_start_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {:?}", raw)))
    }
}
