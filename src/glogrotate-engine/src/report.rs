//! Statistics gathered during a rotation run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::eviction::EvictionOutcome;
use crate::retention::RetentionOutcome;

/// Result of processing one log directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryReport {
    pub directory: PathBuf,
    pub files_compressed: usize,
    pub compression_failures: usize,
    pub deleted_by_age: usize,
    pub deleted_by_size: usize,
    pub bytes_freed: u64,
    /// Set when processing stopped early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirectoryReport {
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn total_deleted(&self) -> usize {
        self.deleted_by_age + self.deleted_by_size
    }

    pub(crate) fn record_retention(&mut self, outcome: &RetentionOutcome) {
        self.files_compressed += outcome.compressed;
        self.compression_failures += outcome.compression_failures;
        self.deleted_by_age += outcome.deleted.len();
        self.bytes_freed += outcome.bytes_freed();
    }

    pub(crate) fn record_eviction(&mut self, outcome: &EvictionOutcome) {
        self.deleted_by_size += outcome.deleted.len();
        self.bytes_freed += outcome.bytes_freed();
    }
}

/// Result of a full run over every configured directory.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub directories: Vec<DirectoryReport>,
}

impl RunReport {
    pub fn total_deleted(&self) -> usize {
        self.directories.iter().map(|d| d.total_deleted()).sum()
    }

    pub fn total_compressed(&self) -> usize {
        self.directories.iter().map(|d| d.files_compressed).sum()
    }

    pub fn bytes_freed(&self) -> u64 {
        self.directories.iter().map(|d| d.bytes_freed).sum()
    }

    /// Directories whose processing stopped on an error.
    pub fn failures(&self) -> impl Iterator<Item = &DirectoryReport> {
        self.directories.iter().filter(|d| !d.is_success())
    }
}
