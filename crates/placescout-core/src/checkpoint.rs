use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// File name of the checkpoint inside the data directory.
pub const CHECKPOINT_FILE: &str = ".placescout_checkpoint.json";

/// Records between checkpoint writes.
pub const CHECKPOINT_INTERVAL: usize = 10;

/// Snapshot of an in-flight run. Diagnostic only; nothing resumes from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCheckpoint {
    pub filename: String,
    pub processed_count: usize,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub scraped_data_count: usize,
}

impl RunCheckpoint {
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis((self.timestamp * 1000.0) as i64)
    }
}

/// Writes and clears the run checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    path: PathBuf,
}

impl CheckpointManager {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CHECKPOINT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist progress when `processed` (records accepted so far) is a
    /// positive multiple of [`CHECKPOINT_INTERVAL`]. Returns whether a
    /// checkpoint was written.
    ///
    /// Write failures are logged and never interrupt the run.
    pub fn maybe_save(&self, destination: &Path, processed: usize, accumulated: usize) -> bool {
        if processed == 0 || processed % CHECKPOINT_INTERVAL != 0 {
            return false;
        }
        let checkpoint = RunCheckpoint {
            filename: destination.display().to_string(),
            processed_count: processed,
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            scraped_data_count: accumulated,
        };
        match self.write(&checkpoint) {
            Ok(()) => {
                tracing::debug!(processed, accumulated, "Checkpoint saved");
                true
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to save checkpoint");
                false
            }
        }
    }

    fn write(&self, checkpoint: &RunCheckpoint) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(checkpoint)?)?;
        Ok(())
    }

    /// Read the current checkpoint, if any.
    pub fn load(&self) -> Result<Option<RunCheckpoint>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AppError::MalformedFile {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// Remove the checkpoint after a successful flush.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Checkpoint cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to clear checkpoint")
            }
        }
    }
}
