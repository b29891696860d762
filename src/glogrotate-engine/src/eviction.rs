//! Size-budget enforcement.
//!
//! While a directory is at or over its byte budget the single oldest candidate,
//! across all levels, is deleted and the directory is scanned again. Only one
//! file is removed per scan, since every deletion changes both the total size
//! and the candidate set.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::record::LogFile;
use crate::scanner::scan;
use crate::{Result, RotateError};

/// What one eviction loop did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionOutcome {
    /// Files removed, oldest first.
    pub deleted: Vec<LogFile>,
    /// Directory size measured by the last scan.
    pub final_size: u64,
}

impl EvictionOutcome {
    pub fn bytes_freed(&self) -> u64 {
        self.deleted.iter().map(|f| f.size_bytes).sum()
    }
}

/// Delete the oldest log files in `dir` until its size drops below `max_bytes`
/// or no candidate is left.
///
/// In `dry_run` mode nothing is removed; deletions are simulated by dropping
/// the files from subsequent scans.
pub fn enforce_size_budget(dir: &Path, max_bytes: u64, dry_run: bool) -> Result<EvictionOutcome> {
    evict(dir, max_bytes, dry_run, &[])
}

/// Eviction loop; `already_removed` lists files an earlier dry-run pass
/// pretended to delete, so they are not counted twice.
pub(crate) fn evict(
    dir: &Path,
    max_bytes: u64,
    dry_run: bool,
    already_removed: &[LogFile],
) -> Result<EvictionOutcome> {
    let mut outcome = EvictionOutcome::default();
    let mut simulated: HashSet<PathBuf> = HashSet::new();
    let mut simulated_bytes = 0u64;
    if dry_run {
        for file in already_removed {
            if simulated.insert(file.path.clone()) {
                simulated_bytes += file.size_bytes;
            }
        }
    }

    loop {
        let mut scanned = scan(dir)?;
        if dry_run {
            scanned.files.retain(|f| !simulated.contains(&f.path));
            scanned.total_size = scanned.total_size.saturating_sub(simulated_bytes);
        }
        outcome.final_size = scanned.total_size;

        let Some(oldest) = scanned.files.pop() else {
            debug!(
                directory = %dir.display(),
                total_size = scanned.total_size,
                "No candidates left to evict"
            );
            break;
        };

        if scanned.total_size < max_bytes {
            debug!(
                directory = %dir.display(),
                total_size = scanned.total_size,
                max_bytes,
                "Directory within size budget"
            );
            break;
        }

        info!(
            directory = %dir.display(),
            total_size = scanned.total_size,
            max_bytes,
            path = %oldest.path.display(),
            "Size budget exceeded, evicting oldest log file"
        );

        if dry_run {
            info!(path = %oldest.path.display(), "[DRY RUN] Would delete");
            simulated.insert(oldest.path.clone());
            simulated_bytes += oldest.size_bytes;
        } else {
            fs::remove_file(&oldest.path).map_err(|source| RotateError::Delete {
                path: oldest.path.clone(),
                source,
            })?;
        }
        outcome.deleted.push(oldest);
    }

    Ok(outcome)
}
