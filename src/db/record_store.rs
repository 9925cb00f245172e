// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity table stored as CSV.
//!
//! Provides:
//! - Read-all (a missing file reads as an empty store)
//! - Atomic replace-all
//! - Upsert-merge (last write wins by activity id)
//! - The sync cursor, derived from the stored timestamps

use crate::db::{files, write_atomic};
use crate::error::AppError;
use crate::models::{ActivityRecord, ACTIVITY_COLUMNS};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// CSV-backed activity store.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Store at `activities.csv` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(files::ACTIVITIES))
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read every stored record.
    ///
    /// Rows that do not decode are logged and left out. A table where no row
    /// decodes is an error, so a wrong layout cannot be mistaken for an empty
    /// history and overwritten.
    pub fn load_all(&self) -> Result<Vec<ActivityRecord>, AppError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to open {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<ActivityRecord>() {
            match row {
                Ok(record) => records.push(record),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(
                        path = %self.path.display(),
                        line = e.position().map(|p| p.line()),
                        error = %e,
                        "Skipping unreadable activity row"
                    );
                }
            }
        }

        if records.is_empty() && skipped > 0 {
            return Err(AppError::Storage(format!(
                "No readable rows in {} ({} rejected)",
                self.path.display(),
                skipped
            )));
        }

        tracing::debug!(
            path = %self.path.display(),
            count = records.len(),
            skipped,
            "Loaded activity table"
        );
        Ok(records)
    }

    /// Replace the whole table with `records`, in the given order.
    ///
    /// An empty slice still produces a header-only table.
    pub fn replace_all(&self, records: &[ActivityRecord]) -> Result<(), AppError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(ACTIVITY_COLUMNS)?;
        for record in records {
            writer.serialize(record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Storage(format!("Failed to flush CSV buffer: {}", e)))?;
        write_atomic(&self.path, &bytes)?;

        tracing::debug!(path = %self.path.display(), count = records.len(), "Activity table written");
        Ok(())
    }

    /// Merge `incoming` into the stored table and persist the result.
    ///
    /// Returns the merged records (newest first).
    pub fn upsert_merge(&self, incoming: Vec<ActivityRecord>) -> Result<Vec<ActivityRecord>, AppError> {
        let merged = merge_records(self.load_all()?, incoming);
        self.replace_all(&merged)?;
        Ok(merged)
    }

    /// Latest stored start timestamp, or `None` for an empty store.
    pub fn cursor(&self) -> Result<Option<NaiveDateTime>, AppError> {
        Ok(sync_cursor(&self.load_all()?))
    }
}

/// Merge two record sets by id, `incoming` winning over `existing`.
///
/// The result holds one record per id, sorted by start timestamp descending
/// (ties broken by id descending so the order is deterministic).
pub fn merge_records(
    existing: Vec<ActivityRecord>,
    incoming: Vec<ActivityRecord>,
) -> Vec<ActivityRecord> {
    let mut by_id: HashMap<u64, ActivityRecord> =
        HashMap::with_capacity(existing.len() + incoming.len());

    for record in existing.into_iter().chain(incoming) {
        by_id.insert(record.id, record);
    }

    let mut merged: Vec<ActivityRecord> = by_id.into_values().collect();
    merged.sort_by(|a, b| {
        b.start_timestamp
            .cmp(&a.start_timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
    merged
}

/// Sync cursor: the maximum start timestamp in `records`.
pub fn sync_cursor(records: &[ActivityRecord]) -> Option<NaiveDateTime> {
    records.iter().map(|r| r.start_timestamp).max()
}
