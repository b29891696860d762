//! Age-based retention for the files of one level.
//!
//! Files are walked newest to oldest. Each one is compressed if it is not
//! already, until the first file older than the retention period is reached.
//! That file is the boundary: it is kept, and every file older than it is
//! deleted.

use chrono::{DateTime, Utc};
use std::fs;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::compress::Compressor;
use crate::record::{Level, LogFile};
use crate::{Result, RotateError};

/// What one retention pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionOutcome {
    /// Files still present, newest first.
    pub retained: Vec<LogFile>,
    /// Files removed because they were past the boundary.
    pub deleted: Vec<LogFile>,
    /// Number of files compressed.
    pub compressed: usize,
    /// Number of files whose compression failed.
    pub compression_failures: usize,
}

impl RetentionOutcome {
    pub fn bytes_freed(&self) -> u64 {
        self.deleted.iter().map(|f| f.size_bytes).sum()
    }
}

/// Apply age retention to `files` (one level, newest first).
///
/// A compression failure is logged and the walk continues. A deletion failure
/// stops the pass and is returned.
pub fn apply_retention(
    level: Level,
    mut files: Vec<LogFile>,
    retention: Duration,
    now: DateTime<Utc>,
    compressor: &dyn Compressor,
    dry_run: bool,
) -> Result<RetentionOutcome> {
    let mut outcome = RetentionOutcome::default();
    let cutoff = cutoff(now, retention);
    debug!(level = %level, cutoff = %cutoff, files = files.len(), "Applying retention");

    let mut boundary = None;
    for (idx, file) in files.iter_mut().enumerate() {
        if !file.compressed {
            if dry_run {
                info!(path = %file.path.display(), "[DRY RUN] Would compress");
                outcome.compressed += 1;
            } else {
                match compressor.compress(&file.path) {
                    Ok(gz_path) => {
                        file.mark_compressed(&gz_path);
                        outcome.compressed += 1;
                    }
                    Err(source) => {
                        let err = RotateError::Compress {
                            path: file.path.clone(),
                            source,
                        };
                        warn!(error = %err, "Skipping compression");
                        outcome.compression_failures += 1;
                    }
                }
            }
        }

        if file.is_older_than(cutoff) {
            boundary = Some(idx);
            break;
        }
    }

    let keep = match boundary {
        Some(idx) if idx + 1 < files.len() => idx + 1,
        _ => {
            outcome.retained = files;
            return Ok(outcome);
        }
    };

    let expired = files.split_off(keep);
    outcome.retained = files;
    for file in expired {
        if dry_run {
            info!(path = %file.path.display(), "[DRY RUN] Would delete expired log file");
        } else {
            fs::remove_file(&file.path).map_err(|source| RotateError::Delete {
                path: file.path.clone(),
                source,
            })?;
            debug!(path = %file.path.display(), level = %level, "Deleted expired log file");
        }
        outcome.deleted.push(file);
    }

    Ok(outcome)
}

/// Instant before which files count as expired.
fn cutoff(now: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(retention)
        .ok()
        .and_then(|retention| now.checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
