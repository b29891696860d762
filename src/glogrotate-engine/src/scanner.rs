//! Directory scanning.
//!
//! A scan lists the top level of a log directory, measures everything in it,
//! and turns recognized log file names into [`LogFile`] records. glog keeps a
//! symlink per level (`app.INFO -> app.INFO.20150320-103857.29198`) pointing at
//! the file it is still writing; both the link and its target are kept out of
//! the candidate set.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::record::LogFile;
use crate::{Result, RotateError};

/// Outcome of scanning one directory.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Candidate files, newest first.
    pub files: Vec<LogFile>,
    /// Combined size of every regular file in the directory, recognized or not.
    pub total_size: u64,
    /// Symlink targets found in the directory.
    pub protected: Vec<PathBuf>,
    /// Entries that were unreadable or did not look like log files.
    pub skipped: usize,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The oldest candidate, if any.
    pub fn oldest(&self) -> Option<&LogFile> {
        self.files.last()
    }
}

/// Scan `dir` for log files.
///
/// Fails only when the directory itself cannot be listed. Entries that vanish
/// or cannot be inspected mid-scan are logged and skipped.
pub fn scan(dir: &Path) -> Result<ScanResult> {
    let scan_error = |reason: String| RotateError::Scan {
        path: dir.to_path_buf(),
        reason,
    };

    let metadata = fs::metadata(dir).map_err(|e| scan_error(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(scan_error("not a directory".to_string()));
    }
    // glob reports an unlistable directory as a per-entry error; probe it here
    // so it fails the scan instead of looking empty.
    fs::read_dir(dir).map_err(|e| scan_error(e.to_string()))?;
    let dir_str = dir
        .to_str()
        .ok_or_else(|| scan_error("path is not valid UTF-8".to_string()))?;

    debug!(directory = %dir.display(), "Scanning log directory");
    let pattern = format!("{}/*", glob::Pattern::escape(dir_str));
    let entries = glob::glob(&pattern).map_err(|e| scan_error(e.to_string()))?;

    let mut result = ScanResult::default();
    let mut candidates = Vec::new();

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %e.path().display(), error = %e.error(), "Failed to read directory entry");
                result.skipped += 1;
                continue;
            }
        };

        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat file, skipping");
                result.skipped += 1;
                continue;
            }
        };

        if metadata.file_type().is_symlink() {
            match fs::read_link(&path) {
                Ok(target) => {
                    let parent = path.parent().unwrap_or(dir);
                    result.protected.push(parent.join(target));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read symlink");
                }
            }
            continue;
        }

        if metadata.is_dir() {
            continue;
        }

        result.total_size += metadata.len();
        match LogFile::from_path(path, metadata.len()) {
            Some(file) => candidates.push(file),
            None => {
                result.skipped += 1;
            }
        }
    }

    let protected: HashSet<PathBuf> = result.protected.iter().map(|p| resolve(p)).collect();
    candidates.retain(|file| {
        let is_protected = protected.contains(&resolve(&file.path));
        if is_protected {
            debug!(path = %file.path.display(), "Skipping symlink target");
        }
        !is_protected
    });

    // Stable: equal timestamps keep directory listing order.
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    result.files = candidates;

    debug!(
        directory = %dir.display(),
        candidates = result.files.len(),
        total_size = result.total_size,
        skipped = result.skipped,
        "Scan complete"
    );
    Ok(result)
}

/// Canonical form of `path` for comparisons, or `path` itself if it cannot be
/// resolved (dangling links).
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, size: usize) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, vec![b'x'; size]).unwrap();
        path
    }

    fn names(result: &ScanResult) -> Vec<&str> {
        result.files.iter().map(|f| f.file_name()).collect()
    }

    #[test]
    fn test_scan_orders_newest_first() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.INFO.20150101-000000.1", 1);
        write(dir.path(), "app.ERROR.20150301-000000.1.gz", 1);
        write(dir.path(), "app.INFO.20150201-000000.1", 1);

        let result = scan(dir.path()).unwrap();

        assert_eq!(
            names(&result),
            vec![
                "app.ERROR.20150301-000000.1.gz",
                "app.INFO.20150201-000000.1",
                "app.INFO.20150101-000000.1",
            ]
        );
        assert_eq!(result.oldest().unwrap().file_name(), "app.INFO.20150101-000000.1");
    }

    #[test]
    fn test_scan_counts_unrecognized_files_in_total_size() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.INFO.20150101-000000.1", 100);
        write(dir.path(), "notes.txt", 50);
        fs::create_dir(dir.path().join("archive")).unwrap();
        write(&dir.path().join("archive"), "app.INFO.20140101-000000.1", 1000);

        let result = scan(dir.path()).unwrap();

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.total_size, 150);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_scan_equal_timestamps_keep_listing_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.INFO.20150101-000000.1", 1);
        write(dir.path(), "a.INFO.20150101-000000.1", 1);

        let result = scan(dir.path()).unwrap();

        assert_eq!(
            names(&result),
            vec!["a.INFO.20150101-000000.1", "b.INFO.20150101-000000.1"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_excludes_symlinks_and_their_targets() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.INFO.20150101-000000.1", 10);
        write(dir.path(), "app.INFO.20150102-000000.2", 10);
        symlink("app.INFO.20150102-000000.2", dir.path().join("app.INFO")).unwrap();

        let result = scan(dir.path()).unwrap();

        assert_eq!(names(&result), vec!["app.INFO.20150101-000000.1"]);
        assert_eq!(result.total_size, 20);
        assert_eq!(result.protected, vec![dir.path().join("app.INFO.20150102-000000.2")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_symlink_with_log_name_is_not_a_candidate() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = write(outside.path(), "elsewhere.log", 10);
        symlink(&target, dir.path().join("app.INFO.20150101-000000.1")).unwrap();

        let result = scan(dir.path()).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.total_size, 0);
    }

    #[test]
    fn test_scan_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = scan(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, RotateError::Scan { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_directory_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let base = TempDir::new().unwrap();
        let dir = base.path().join("reg");
        fs::create_dir(&dir).unwrap();
        write(&dir, "app.INFO.20150101-000000.1", 1);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o311)).unwrap();

        // Permission bits do not apply to root.
        if fs::read_dir(&dir).is_ok() {
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = scan(&dir);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(RotateError::Scan { .. })));
    }

    #[test]
    fn test_scan_file_instead_of_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "app.INFO.20150101-000000.1", 1);
        assert!(matches!(scan(&file), Err(RotateError::Scan { .. })));
    }
}
