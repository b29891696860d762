//! Retention engine for glog-style log directories.
//!
//! Log files written by glog carry their severity and creation time in the
//! file name (`app.host.user.log.INFO.20150320-103857.29198`). This crate
//! keeps such directories in shape:
//!
//! - **Compression**: every retained file is gzipped in place
//! - **Age retention**: per-level thresholds delete files past their age,
//!   keeping the newest expired file as a boundary marker
//! - **Size budget**: the oldest files across all levels are evicted until
//!   the directory fits under a byte budget
//! - **Symlink protection**: the `app.INFO` style links glog keeps for the
//!   active file, and their targets, are never touched
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌──────────────────┐   ┌───────────────┐
//! │  scanner  │──▶│  classify  │──▶│ retention (each  │──▶│ eviction      │
//! │  (scan)   │   │ (by level) │   │ level, compress) │   │ (re-scans)    │
//! └───────────┘   └────────────┘   └──────────────────┘   └───────────────┘
//!                         driven per directory by `Rotator`
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use glogrotate_engine::{RotateConfig, Rotator};
//!
//! let config = RotateConfig::default()
//!     .base_dir("/var/log")
//!     .log_name("reg");
//! let rotator = Rotator::new(config).expect("invalid config");
//!
//! let report = rotator.run();
//! println!("deleted {} files", report.total_deleted());
//! ```

pub mod classify;
pub mod compress;
pub mod config;
pub mod eviction;
pub mod record;
pub mod report;
pub mod retention;
pub mod rotator;
pub mod scanner;

pub use classify::{LevelFiles, classify};
pub use compress::{Compressor, ExternalCompressor, GZIP_SUFFIX, GzipCompressor};
pub use config::{
    CompressionConfig, CompressionMethod, DEFAULT_BASE_DIR, DEFAULT_ERROR_RETENTION,
    DEFAULT_INFO_RETENTION, DEFAULT_MAX_TOTAL_SIZE, DEFAULT_WARNING_RETENTION, GIB,
    RetentionConfig, RotateConfig,
};
pub use eviction::{EvictionOutcome, enforce_size_budget};
pub use record::{Level, LogFile, parse_log_file_name};
pub use report::{DirectoryReport, RunReport};
pub use retention::{RetentionOutcome, apply_retention};
pub use rotator::Rotator;
pub use scanner::{ScanResult, scan};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the retention engine.
///
/// Per-file problems that the engine tolerates (unreadable metadata, failed
/// compression, unparseable names) are logged and counted instead of being
/// returned.
#[derive(Debug, Error)]
pub enum RotateError {
    /// The directory could not be listed.
    #[error("Cannot scan {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    /// A file could not be removed.
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be compressed.
    #[error("Failed to compress {path}: {source}")]
    Compress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RotateError>;
