//! Configuration for the retention engine.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::compress::{Compressor, ExternalCompressor, GzipCompressor};
use crate::record::Level;
use crate::{Result, RotateError};

// ============================================================================
// Constants
// ============================================================================

/// One gibibyte.
pub const GIB: u64 = 1 << 30;

/// Default directory holding the per-program log directories.
pub const DEFAULT_BASE_DIR: &str = "/var/log/";

const DAY: u64 = 24 * 60 * 60;

/// Default retention for INFO files (60 days).
pub const DEFAULT_INFO_RETENTION: Duration = Duration::from_secs(60 * DAY);

/// Default retention for WARNING files (180 days).
pub const DEFAULT_WARNING_RETENTION: Duration = Duration::from_secs(180 * DAY);

/// Default retention for ERROR and FATAL files (180 days).
pub const DEFAULT_ERROR_RETENTION: Duration = Duration::from_secs(180 * DAY);

/// Default size budget per directory (2 GiB).
pub const DEFAULT_MAX_TOTAL_SIZE: u64 = 2 * GIB;

/// Default gzip compression level.
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Default external compression program.
pub const DEFAULT_GZIP_PROGRAM: &str = "gzip";

// ============================================================================
// Retention
// ============================================================================

/// Age thresholds per level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Delete INFO files older than this.
    #[serde(with = "humantime_serde", default = "default_info_retention")]
    pub info: Duration,

    /// Delete WARNING files older than this.
    #[serde(with = "humantime_serde", default = "default_warning_retention")]
    pub warning: Duration,

    /// Delete ERROR and FATAL files older than this.
    #[serde(with = "humantime_serde", default = "default_error_retention")]
    pub error: Duration,
}

fn default_info_retention() -> Duration {
    DEFAULT_INFO_RETENTION
}

fn default_warning_retention() -> Duration {
    DEFAULT_WARNING_RETENTION
}

fn default_error_retention() -> Duration {
    DEFAULT_ERROR_RETENTION
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            info: DEFAULT_INFO_RETENTION,
            warning: DEFAULT_WARNING_RETENTION,
            error: DEFAULT_ERROR_RETENTION,
        }
    }
}

impl RetentionConfig {
    /// Retention period applying to `level`.
    pub fn for_level(&self, level: Level) -> Duration {
        match level {
            Level::Info => self.info,
            Level::Warning => self.warning,
            Level::Error | Level::Fatal => self.error,
        }
    }
}

// ============================================================================
// Compression
// ============================================================================

/// How files get gzipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    /// In-process gzip.
    #[default]
    Builtin,
    /// Spawn an external program.
    External,
}

impl std::str::FromStr for CompressionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "builtin" => Ok(Self::Builtin),
            "external" => Ok(Self::External),
            _ => Err(format!("Unknown compression method: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    #[serde(default)]
    pub method: CompressionMethod,

    /// Gzip level (1-9) for the builtin method.
    #[serde(default = "default_gzip_level")]
    pub level: u32,

    /// Program invoked as `<program> <file>` for the external method.
    #[serde(default = "default_gzip_program")]
    pub program: String,
}

fn default_gzip_level() -> u32 {
    DEFAULT_GZIP_LEVEL
}

fn default_gzip_program() -> String {
    DEFAULT_GZIP_PROGRAM.to_string()
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Builtin,
            level: DEFAULT_GZIP_LEVEL,
            program: DEFAULT_GZIP_PROGRAM.to_string(),
        }
    }
}

impl CompressionConfig {
    /// Build the configured compressor.
    pub fn compressor(&self) -> Box<dyn Compressor> {
        match self.method {
            CompressionMethod::Builtin => Box::new(GzipCompressor::new(self.level)),
            CompressionMethod::External => Box::new(ExternalCompressor::new(&self.program)),
        }
    }
}

// ============================================================================
// Top-level configuration
// ============================================================================

/// Configuration for a rotation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateConfig {
    /// Directory containing the log directories.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Log directories to process, relative to `base_dir`.
    #[serde(default)]
    pub log_names: Vec<String>,

    #[serde(default)]
    pub retention: RetentionConfig,

    /// Evict oldest files while a directory holds at least this many bytes
    /// (0 = no size limit).
    #[serde(default = "default_max_total_size")]
    pub max_total_size: u64,

    #[serde(default)]
    pub compression: CompressionConfig,

    /// Log actions without touching any file.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BASE_DIR)
}

fn default_max_total_size() -> u64 {
    DEFAULT_MAX_TOTAL_SIZE
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            log_names: Vec::new(),
            retention: RetentionConfig::default(),
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
            compression: CompressionConfig::default(),
            dry_run: false,
        }
    }
}

impl RotateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| RotateError::Config(e.to_string()))
    }

    /// Load a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.log_names.is_empty() {
            return Err(RotateError::Config("no log names configured".to_string()));
        }

        for name in &self.log_names {
            let path = Path::new(name);
            let escapes = path.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
            if name.is_empty() || escapes {
                return Err(RotateError::Config(format!(
                    "log name {name:?} must be a directory below the base directory"
                )));
            }
        }

        for level in Level::ALL {
            if self.retention.for_level(level).is_zero() {
                return Err(RotateError::Config(format!(
                    "retention for {level} must be greater than zero"
                )));
            }
        }

        if self.compression.method == CompressionMethod::Builtin
            && !(1..=9).contains(&self.compression.level)
        {
            return Err(RotateError::Config(format!(
                "gzip level must be between 1 and 9, got {}",
                self.compression.level
            )));
        }

        if self.compression.method == CompressionMethod::External
            && self.compression.program.trim().is_empty()
        {
            return Err(RotateError::Config(
                "external compression requires a program".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute directories to process, in configuration order.
    pub fn log_dirs(&self) -> Vec<PathBuf> {
        self.log_names
            .iter()
            .map(|name| self.base_dir.join(name))
            .collect()
    }

    /// Builder: set the base directory.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Builder: add a log directory name.
    pub fn log_name(mut self, name: impl Into<String>) -> Self {
        self.log_names.push(name.into());
        self
    }

    /// Builder: set the retention for one level.
    pub fn retention_for(mut self, level: Level, retention: Duration) -> Self {
        match level {
            Level::Info => self.retention.info = retention,
            Level::Warning => self.retention.warning = retention,
            Level::Error | Level::Fatal => self.retention.error = retention,
        }
        self
    }

    /// Builder: set the size budget.
    pub fn max_total_size(mut self, bytes: u64) -> Self {
        self.max_total_size = bytes;
        self
    }

    /// Builder: set dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
