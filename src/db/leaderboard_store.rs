//! Leaderboard document stored as a JSON array.

use crate::db::{files, write_atomic};
use crate::error::AppError;
use crate::models::LeaderboardEntry;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON-backed leaderboard store. Only ever replaced wholesale.
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    path: PathBuf,
}

impl LeaderboardStore {
    /// Store at `leaderboards.json` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::at_path(data_dir.as_ref().join(files::LEADERBOARDS))
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current entries. A missing file reads as an empty list.
    pub fn load(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Replace the document with `entries`.
    pub fn replace_all(&self, entries: &[LeaderboardEntry]) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!(path = %self.path.display(), count = entries.len(), "Leaderboard written");
        Ok(())
    }

    /// Create an empty document if none exists; an existing one is left alone.
    pub fn ensure_exists(&self) -> Result<(), AppError> {
        if self.path.is_file() {
            return Ok(());
        }
        self.replace_all(&[])
    }
}
