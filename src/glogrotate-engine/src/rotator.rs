//! Per-directory orchestration.

use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::classify::classify;
use crate::compress::Compressor;
use crate::config::RotateConfig;
use crate::eviction::evict;
use crate::record::Level;
use crate::report::{DirectoryReport, RunReport};
use crate::retention::apply_retention;
use crate::scanner::scan;
use crate::Result;

/// Runs compression, age retention and size eviction over every configured
/// log directory.
///
/// Directories are processed one after another; a failure in one is recorded
/// in its report and does not stop the others.
pub struct Rotator {
    config: RotateConfig,
    compressor: Box<dyn Compressor>,
}

impl Rotator {
    /// Create a rotator using the compressor described by the config.
    pub fn new(config: RotateConfig) -> Result<Self> {
        let compressor = config.compression.compressor();
        Self::with_compressor(config, compressor)
    }

    /// Create a rotator with a custom compressor.
    pub fn with_compressor(config: RotateConfig, compressor: Box<dyn Compressor>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, compressor })
    }

    pub fn config(&self) -> &RotateConfig {
        &self.config
    }

    /// Process every configured directory.
    pub fn run(&self) -> RunReport {
        self.run_at(Utc::now())
    }

    /// Process every configured directory, measuring ages against `now`.
    pub fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let started = Instant::now();
        let mut directories = Vec::with_capacity(self.config.log_names.len());

        for dir in self.config.log_dirs() {
            let mut report = DirectoryReport::new(&dir);
            match self.rotate_directory(&dir, now, &mut report) {
                Ok(()) => {
                    info!(
                        directory = %dir.display(),
                        compressed = report.files_compressed,
                        deleted_by_age = report.deleted_by_age,
                        deleted_by_size = report.deleted_by_size,
                        bytes_freed = report.bytes_freed,
                        "Cleanup finished"
                    );
                }
                Err(e) => {
                    error!(directory = %dir.display(), error = %e, "Cleanup aborted");
                    report.error = Some(e.to_string());
                }
            }
            directories.push(report);
        }

        RunReport {
            started_at: now,
            duration_ms: started.elapsed().as_millis() as u64,
            dry_run: self.config.dry_run,
            directories,
        }
    }

    /// Run the full pipeline on one directory, accumulating into `report`.
    ///
    /// Stops at the first scan or deletion error.
    pub fn rotate_directory(
        &self,
        dir: &Path,
        now: DateTime<Utc>,
        report: &mut DirectoryReport,
    ) -> Result<()> {
        let dry_run = self.config.dry_run;
        let mut levels = classify(scan(dir)?.files);
        let mut removed = Vec::new();

        for level in Level::ALL {
            let Some(files) = levels.remove(&level) else {
                continue;
            };
            debug!(directory = %dir.display(), level = %level, files = files.len(), "Cleaning level");

            let outcome = apply_retention(
                level,
                files,
                self.config.retention.for_level(level),
                now,
                self.compressor.as_ref(),
                dry_run,
            )?;
            report.record_retention(&outcome);
            if dry_run {
                removed.extend(outcome.deleted);
            }
        }

        if self.config.max_total_size == 0 {
            debug!(directory = %dir.display(), "Size limit disabled");
            return Ok(());
        }

        let outcome = evict(dir, self.config.max_total_size, dry_run, &removed)?;
        report.record_eviction(&outcome);
        Ok(())
    }
}

impl std::fmt::Debug for Rotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rotator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::GzipCompressor;
    use crate::config::GIB;
    use chrono::TimeZone;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 3, 30, 13, 10, 0).unwrap()
    }

    fn config(base: &Path) -> RotateConfig {
        RotateConfig::new()
            .base_dir(base)
            .log_name("app")
            .retention_for(Level::Info, 30 * DAY)
            .retention_for(Level::Warning, 60 * DAY)
            .retention_for(Level::Error, 90 * DAY)
            .max_total_size(GIB)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(Rotator::new(RotateConfig::default()).is_err());
    }

    #[test]
    fn test_config_is_kept_as_given() {
        let base = TempDir::new().unwrap();
        let rotator = Rotator::new(config(base.path()).dry_run(true)).unwrap();
        assert_eq!(rotator.config(), &config(base.path()).dry_run(true));
    }

    #[test]
    fn test_levels_use_their_own_retention() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("app");
        fs::create_dir(&dir).unwrap();
        for name in [
            "app.INFO.20150320-000000.1",
            "app.INFO.20150215-000000.1",
            "app.INFO.20150110-000000.1",
            "app.WARNING.20150320-000000.1",
            "app.WARNING.20150115-000000.1",
            "app.WARNING.20141210-000000.1",
            "app.ERROR.20150320-000000.1",
            "app.ERROR.20150110-000000.1",
            "app.ERROR.20141210-000000.1",
        ] {
            fs::write(dir.join(name), "x").unwrap();
        }

        let rotator = Rotator::new(config(base.path())).unwrap();
        let report = rotator.run_at(now());

        assert!(report.failures().next().is_none());
        let dir_report = &report.directories[0];
        // INFO: 20150215 is the boundary, 20150110 goes.
        // WARNING: 20150115 is the boundary, 20141210 goes.
        // ERROR: nothing is older than 90 days except 20141210, which is last.
        assert_eq!(dir_report.deleted_by_age, 2);
        assert!(!dir.join("app.INFO.20150110-000000.1").exists());
        assert!(!dir.join("app.WARNING.20141210-000000.1").exists());
        assert!(dir.join("app.ERROR.20141210-000000.1.gz").exists());
        assert!(dir.join("app.INFO.20150215-000000.1.gz").exists());
        assert_eq!(dir_report.files_compressed, 7);
    }

    #[test]
    fn test_missing_directory_does_not_stop_others() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("present");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("app.INFO.20150329-000000.1"), "x").unwrap();

        let config = config(base.path()).log_name("present");
        let rotator = Rotator::with_compressor(config, Box::new(GzipCompressor::default())).unwrap();
        let report = rotator.run_at(now());

        assert_eq!(report.directories.len(), 2);
        assert!(!report.directories[0].is_success());
        assert!(report.directories[1].is_success());
        assert!(dir.join("app.INFO.20150329-000000.1.gz").exists());
    }

    #[test]
    fn test_zero_size_limit_disables_eviction() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("app");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("app.INFO.20150329-000000.1.gz"), "x").unwrap();

        let rotator = Rotator::new(config(base.path()).max_total_size(0)).unwrap();
        let report = rotator.run_at(now());

        assert_eq!(report.total_deleted(), 0);
        assert!(dir.join("app.INFO.20150329-000000.1.gz").exists());
    }

    /// Gzips normally, but removes `victim` first so its later deletion fails.
    struct VictimCompressor {
        victim: PathBuf,
        calls: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl Compressor for VictimCompressor {
        fn compress(&self, path: &Path) -> io::Result<PathBuf> {
            let _ = fs::remove_file(&self.victim);
            self.calls.lock().unwrap().push(path.to_path_buf());
            GzipCompressor::default().compress(path)
        }
    }

    #[test]
    fn test_deletion_failure_aborts_remaining_levels_and_eviction() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("app");
        fs::create_dir(&dir).unwrap();
        for name in [
            "app.INFO.20150329-000000.1",
            "app.INFO.20150210-000000.1",
            "app.INFO.20150101-000000.1",
            "app.WARNING.20150329-000000.1",
        ] {
            fs::write(dir.join(name), "x").unwrap();
        }

        let calls = Arc::new(Mutex::new(Vec::new()));
        let compressor = VictimCompressor {
            victim: dir.join("app.INFO.20150101-000000.1"),
            calls: Arc::clone(&calls),
        };
        let rotator =
            Rotator::with_compressor(config(base.path()).max_total_size(1), Box::new(compressor))
                .unwrap();
        let report = rotator.run_at(now());

        let dir_report = &report.directories[0];
        let error = dir_report.error.as_deref().unwrap();
        assert!(error.contains("Failed to delete"), "{error}");
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                dir.join("app.INFO.20150329-000000.1"),
                dir.join("app.INFO.20150210-000000.1"),
            ]
        );
        // WARNING was never reached and size eviction never ran.
        assert!(dir.join("app.WARNING.20150329-000000.1").exists());
        assert!(dir.join("app.INFO.20150329-000000.1.gz").exists());
        assert!(dir.join("app.INFO.20150210-000000.1.gz").exists());
        assert_eq!(dir_report.deleted_by_size, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let base = TempDir::new().unwrap();
        let dir = base.path().join("app");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("app.INFO.20150101-000000.1"), "x").unwrap();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o311)).unwrap();

        // Permission bits do not apply to root.
        if fs::read_dir(&dir).is_ok() {
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = Rotator::new(config(base.path())).unwrap().run_at(now());
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(!report.directories[0].is_success());
        assert!(dir.join("app.INFO.20150101-000000.1").exists());
    }
}
