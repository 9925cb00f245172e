// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity ingestion service.
//!
//! Handles the sync workflow:
//! 1. Derive the cursor from the record store (or ignore it on full reset)
//! 2. Stream raw activities from the source
//! 3. Normalize each record, skipping the malformed ones
//! 4. Merge into the store (last write wins) and replace it atomically
//!
//! A transport failure stops the stream but whatever was already normalized is
//! still merged and persisted.

use crate::config::SyncMode;
use crate::db::record_store::{merge_records, sync_cursor};
use crate::db::RecordStore;
use crate::error::{RecordError, Result};
use crate::models::ActivityRecord;
pub use crate::models::activity::normalize_activity_type;
use crate::services::source::{quantity_value, ActivitySource, RawActivity, RawQuantity};
use crate::time_utils::parse_start_timestamp;
use chrono::NaiveDateTime;
use futures_util::StreamExt;

/// Default number of processed records between progress checkpoints.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Meters per second to kilometers per hour.
const MS_TO_KMH: f64 = 3.6;

/// Drives a fetch from an [`ActivitySource`] into a [`RecordStore`].
pub struct IngestionEngine<'a, S: ActivitySource + ?Sized> {
    source: &'a S,
    store: &'a RecordStore,
    mode: SyncMode,
    progress_interval: usize,
}

impl<'a, S: ActivitySource + ?Sized> IngestionEngine<'a, S> {
    pub fn new(source: &'a S, store: &'a RecordStore, mode: SyncMode) -> Self {
        Self {
            source,
            store,
            mode,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Run one sync and return the persisted records (newest first).
    ///
    /// Only store I/O failures are returned as errors. Malformed records and
    /// transport failures are reported in [`SyncReport`].
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let existing = match self.mode {
            SyncMode::Incremental => self.store.load_all()?,
            SyncMode::FullReset => Vec::new(),
        };
        let cursor = sync_cursor(&existing);

        tracing::info!(
            mode = ?self.mode,
            cursor = ?cursor,
            stored = existing.len(),
            "Starting activity sync"
        );

        let mut report = SyncReport {
            mode: self.mode,
            cursor,
            ..SyncReport::default()
        };
        let mut normalized = Vec::new();
        let mut stream = self.source.fetch_activities(cursor);

        while let Some(item) = stream.next().await {
            let raw = match item {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        processed = report.fetched,
                        "Activity stream failed, keeping records fetched so far"
                    );
                    report.aborted = Some(e.to_string());
                    break;
                }
            };

            report.fetched += 1;
            match normalize_activity(&raw) {
                Ok(record) => normalized.push(record),
                Err(e) => {
                    report.skipped += 1;
                    tracing::warn!(activity_id = ?raw.id, error = %e, "Skipping malformed activity");
                }
            }

            if report.fetched % self.progress_interval == 0 {
                tracing::info!(processed = report.fetched, "Sync progress");
            }
        }
        drop(stream);

        report.normalized = normalized.len();

        let records = if self.mode == SyncMode::FullReset && report.aborted.is_some() {
            // An interrupted reset must not shrink the store to a partial
            // history; fold the partial batch into what was there instead.
            tracing::warn!("Full reset interrupted, merging partial batch into existing store");
            merge_records(self.store.load_all()?, normalized)
        } else {
            merge_records(existing, normalized)
        };

        self.store.replace_all(&records)?;
        report.stored = records.len();

        tracing::info!(
            fetched = report.fetched,
            normalized = report.normalized,
            skipped = report.skipped,
            stored = report.stored,
            aborted = report.aborted.is_some(),
            "Activity sync finished"
        );

        Ok(SyncOutcome { records, report })
    }
}

/// Records persisted by a sync together with its report.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub records: Vec<ActivityRecord>,
    pub report: SyncReport,
}

/// What happened during one sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// Cursor the fetch was bounded by
    pub cursor: Option<NaiveDateTime>,
    /// Raw records received
    pub fetched: usize,
    pub normalized: usize,
    /// Raw records dropped as malformed
    pub skipped: usize,
    /// Records in the store after the run
    pub stored: usize,
    /// Transport error that cut the fetch short, if any
    pub aborted: Option<String>,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self {
            mode: SyncMode::Incremental,
            cursor: None,
            fetched: 0,
            normalized: 0,
            skipped: 0,
            stored: 0,
            aborted: None,
        }
    }
}

/// Convert one raw activity into a store record.
pub fn normalize_activity(raw: &RawActivity) -> std::result::Result<ActivityRecord, RecordError> {
    let id = raw.id.ok_or(RecordError::MissingField("id"))?;

    let start_raw = raw
        .start_date_local
        .as_deref()
        .or(raw.start_date.as_deref())
        .ok_or(RecordError::MissingField("start_date_local"))?;
    let start_timestamp = parse_start_timestamp(start_raw)
        .ok_or_else(|| RecordError::InvalidTimestamp(start_raw.to_string()))?;

    let type_raw = raw
        .activity_type
        .as_deref()
        .or(raw.sport_type.as_deref())
        .ok_or(RecordError::MissingField("type"))?;
    let activity_type = normalize_activity_type(type_raw)
        .ok_or_else(|| RecordError::EmptyActivityType(type_raw.to_string()))?;

    let energy_kj = match raw.kilojoules.as_ref() {
        Some(q) => Some(non_negative("kilojoules", Some(q))?),
        None => None,
    };

    Ok(ActivityRecord {
        id,
        name: raw.name.clone().unwrap_or_default(),
        start_timestamp,
        distance_km: non_negative("distance", raw.distance.as_ref())? / 1000.0,
        moving_time_min: non_negative("moving_time", raw.moving_time.as_ref())? / 60.0,
        elevation_gain_m: non_negative("total_elevation_gain", raw.total_elevation_gain.as_ref())?,
        activity_type,
        average_speed_kmh: non_negative("average_speed", raw.average_speed.as_ref())? * MS_TO_KMH,
        pr_count: raw.pr_count.unwrap_or(0),
        kudos: raw.kudos_count.unwrap_or(0),
        energy_kj,
    })
}

fn non_negative(
    field: &'static str,
    quantity: Option<&RawQuantity>,
) -> std::result::Result<f64, RecordError> {
    let value =
        quantity_value(quantity).map_err(|value| RecordError::InvalidQuantity { field, value })?;
    if value < 0.0 {
        return Err(RecordError::InvalidQuantity {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw_run() -> RawActivity {
        RawActivity {
            id: Some(42),
            name: Some("Morning Run".to_string()),
            start_date_local: Some("2024-03-10T07:15:00Z".to_string()),
            activity_type: Some("Run".to_string()),
            distance: Some(RawQuantity::Plain(10_000.0)),
            moving_time: Some(RawQuantity::Plain(3_000.0)),
            total_elevation_gain: Some(RawQuantity::Magnitude { magnitude: 85.0 }),
            average_speed: Some(RawQuantity::Num { num: 3.0 }),
            pr_count: Some(2),
            kudos_count: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_units() {
        let record = normalize_activity(&raw_run()).unwrap();

        assert_eq!(record.id, 42);
        assert_eq!(record.distance_km, 10.0);
        assert_eq!(record.moving_time_min, 50.0);
        assert_eq!(record.elevation_gain_m, 85.0);
        assert!((record.average_speed_kmh - 10.8).abs() < 1e-9);
        assert_eq!(record.pr_count, 2);
        assert_eq!(record.kudos, 5);
        assert_eq!(record.energy_kj, None);
        assert_eq!(
            record.start_timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 10)
                .unwrap()
                .and_hms_opt(7, 15, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_missing_quantities_default_to_zero() {
        let raw = RawActivity {
            distance: None,
            moving_time: None,
            total_elevation_gain: None,
            average_speed: None,
            pr_count: None,
            kudos_count: None,
            ..raw_run()
        };
        let record = normalize_activity(&raw).unwrap();
        assert_eq!(record.distance_km, 0.0);
        assert_eq!(record.average_speed_kmh, 0.0);
        assert_eq!(record.kudos, 0);
    }

    #[test]
    fn test_missing_id_is_record_error() {
        let raw = RawActivity {
            id: None,
            ..raw_run()
        };
        assert_eq!(
            normalize_activity(&raw),
            Err(RecordError::MissingField("id"))
        );
    }

    #[test]
    fn test_bad_timestamp_is_record_error() {
        let raw = RawActivity {
            start_date_local: Some("not a date".to_string()),
            ..raw_run()
        };
        assert!(matches!(
            normalize_activity(&raw),
            Err(RecordError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_negative_distance_is_record_error() {
        let raw = RawActivity {
            distance: Some(RawQuantity::Plain(-5.0)),
            ..raw_run()
        };
        assert!(matches!(
            normalize_activity(&raw),
            Err(RecordError::InvalidQuantity {
                field: "distance",
                ..
            })
        ));
    }

    #[test]
    fn test_energy_reading_kept() {
        let raw = RawActivity {
            kilojoules: Some(RawQuantity::Text("512.5".to_string())),
            ..raw_run()
        };
        assert_eq!(normalize_activity(&raw).unwrap().energy_kj, Some(512.5));
    }

    #[test]
    fn test_type_falls_back_to_sport_type() {
        let raw = RawActivity {
            activity_type: None,
            sport_type: Some("root='Walk'".to_string()),
            ..raw_run()
        };
        assert_eq!(normalize_activity(&raw).unwrap().activity_type, "Walk");
    }
}
