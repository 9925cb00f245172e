//! Storage layer (flat files in the data directory).
//!
//! Both stores are replaced wholesale: the new content is written to a sibling
//! temp file and renamed over the old one, so a reader sees either the previous
//! file or the complete new one, never a truncated file.

pub mod leaderboard_store;
pub mod record_store;

pub use leaderboard_store::LeaderboardStore;
pub use record_store::RecordStore;

use crate::error::AppError;
use std::fs;
use std::io::Write;
use std::path::Path;

/// File names as constants.
pub mod files {
    pub const ACTIVITIES: &str = "activities.csv";
    pub const LEADERBOARDS: &str = "leaderboards.json";
}

/// Write `contents` to `path` atomically (temp file + rename).
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    let written = write_and_rename(temp_path, path, contents);
    if written.is_err() {
        // Best effort; the original error is what gets reported.
        let _ = fs::remove_file(temp_path);
    }
    written
}

fn write_and_rename(temp_path: &Path, path: &Path, contents: &[u8]) -> Result<(), AppError> {
    let mut file = fs::File::create(temp_path).map_err(|e| {
        AppError::Storage(format!("Failed to create {}: {}", temp_path.display(), e))
    })?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    // Atomic rename
    fs::rename(temp_path, path)
        .map_err(|e| AppError::Storage(format!("Failed to rename temp file: {}", e)))?;
    Ok(())
}
